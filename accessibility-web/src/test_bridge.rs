//! `window.__accessibilityTest`: a hook for browser automation, installed
//! only when the page is opened with `?test=1`.
use std::cell::RefCell;

use accessibility_core::{
    AccessibilityPreferences, Action, EngineState, Feature, FeatureState, KeyInput,
    SpeechPreferences, key_from_code, resolve,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::dom;
use crate::widget::{self, Widget};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub preferences: AccessibilityPreferences,
    pub speech: SpeechPreferences,
    pub engine: EngineState,
    pub features: Vec<FeatureState>,
    pub menu_open: bool,
    pub spoken: Vec<String>,
}

impl BridgeState {
    #[must_use]
    pub fn capture(widget: &Widget) -> Self {
        let engine = &widget.engine;
        Self {
            preferences: engine.snapshot(),
            speech: engine.speech_preferences(),
            engine: *engine.state(),
            features: engine.feature_states(),
            menu_open: widget.dropdown.is_open(),
            spoken: engine.narrator().synth().spoken(),
        }
    }
}

/// Resolve a bridge key request (`"KeyC"`, with or without Alt).
#[must_use]
pub fn bridge_action(code: &str, alt: bool) -> Option<Action> {
    resolve(KeyInput {
        key: key_from_code(code)?,
        alt,
        ctrl: false,
        meta: false,
        editing: false,
    })
}

struct BridgeBindings {
    _state: Closure<dyn FnMut() -> JsValue>,
    _toggle: Closure<dyn FnMut(JsValue) -> bool>,
    _key: Closure<dyn FnMut(JsValue, JsValue) -> bool>,
    _reset: Closure<dyn FnMut()>,
}

thread_local! {
    static BINDINGS: RefCell<Option<BridgeBindings>> = const { RefCell::new(None) };
}

fn state_value() -> JsValue {
    widget::with_widget(|w| BridgeState::capture(w))
        .and_then(|state| serde_wasm_bindgen::to_value(&state).ok())
        .unwrap_or(JsValue::NULL)
}

fn set_fn(bridge: &js_sys::Object, name: &str, func: &JsValue) {
    let _ = js_sys::Reflect::set(bridge, &JsValue::from_str(name), func);
}

/// Install the bridge when test mode is on. Returns whether it was installed.
pub fn install() -> bool {
    if !dom::test_mode_enabled() {
        return false;
    }
    let Some(window) = dom::window() else {
        return false;
    };

    let state = Closure::wrap(Box::new(state_value) as Box<dyn FnMut() -> JsValue>);
    let toggle = Closure::wrap(Box::new(|value: JsValue| {
        let Some(feature) = value.as_string().and_then(|m| Feature::from_marker(&m)) else {
            return false;
        };
        widget::with_widget(|w| w.engine.toggle(feature)).is_some()
    }) as Box<dyn FnMut(JsValue) -> bool>);
    let key = Closure::wrap(Box::new(|code: JsValue, alt: JsValue| {
        let Some(action) = code
            .as_string()
            .and_then(|code| bridge_action(&code, alt.is_truthy()))
        else {
            return false;
        };
        widget::with_widget(|w| widget::dispatch(w, action)).is_some()
    }) as Box<dyn FnMut(JsValue, JsValue) -> bool>);
    let reset = Closure::wrap(Box::new(|| {
        widget::with_widget(|w| widget::dispatch(w, Action::ResetAll));
    }) as Box<dyn FnMut()>);

    let bridge = js_sys::Object::new();
    set_fn(&bridge, "state", state.as_ref());
    set_fn(&bridge, "toggle", toggle.as_ref());
    set_fn(&bridge, "key", key.as_ref());
    set_fn(&bridge, "reset", reset.as_ref());
    let _ = js_sys::Reflect::set(&window, &JsValue::from_str("__accessibilityTest"), &bridge);

    BINDINGS.with(|slot| {
        *slot.borrow_mut() = Some(BridgeBindings {
            _state: state,
            _toggle: toggle,
            _key: key,
            _reset: reset,
        });
    });
    log::info!("test bridge installed");
    true
}
