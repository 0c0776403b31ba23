//! Browser wiring: one engine per page, bound to the widget markup.
use std::cell::{Cell, RefCell};

use accessibility_core::{
    Action, ClickDisposition, Dropdown, Feature, KeyInput, LinkCursor, MenuLayout,
    SpeechPreferences, ToggleEngine, WidgetConfig, ids, key_from_code, resolve,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, Event, EventTarget, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::dom;
use crate::error::WebError;
use crate::reader;
use crate::speech::BrowserSpeech;
use crate::storage::BrowserStorage;
use crate::surface::DomSurface;

pub type WebEngine = ToggleEngine<BrowserStorage, DomSurface, BrowserSpeech>;

const SCROLL_STEP_PX: f64 = 100.0;
const NOTICE_MS: i32 = 4000;
const UNSUPPORTED_NOTICE: &str = "Text-to-speech is not supported in this browser.";

pub struct Widget {
    pub engine: WebEngine,
    pub dropdown: Dropdown,
    links: Vec<HtmlElement>,
    cursor: LinkCursor,
}

type Listener = Closure<dyn FnMut(Event)>;

thread_local! {
    static WIDGET: RefCell<Option<Widget>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<Vec<Listener>> = const { RefCell::new(Vec::new()) };
    static RESIZE_TIMER: Cell<Option<i32>> = const { Cell::new(None) };
}

/// Run `f` against the mounted widget. Returns `None` before mount or when
/// called re-entrantly from inside another widget callback.
pub fn with_widget<R>(f: impl FnOnce(&mut Widget) -> R) -> Option<R> {
    WIDGET.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            log::warn!("widget is busy; ignoring nested event");
            return None;
        };
        let result = slot.as_mut().map(f);
        drop(slot);
        if result.is_some() {
            flush_notice();
        }
        result
    })
}

#[must_use]
pub fn is_mounted() -> bool {
    WIDGET.with(|cell| cell.try_borrow().is_ok_and(|slot| slot.is_some()))
}

/// Read the inline JSON configuration, if the page provides one.
#[must_use]
pub fn read_config() -> WidgetConfig {
    let Some(json) = dom::by_id(ids::CONFIG_SCRIPT).and_then(|el| el.text_content()) else {
        return WidgetConfig::default();
    };
    WidgetConfig::from_json(&json).unwrap_or_else(|err| {
        log::warn!("ignoring accessibility configuration: {err}");
        WidgetConfig::default()
    })
}

/// Build the engine, restore persisted preferences and bind every control.
/// Mounting twice is a no-op.
///
/// # Errors
/// Returns an error when no document is available.
pub fn mount(config: WidgetConfig) -> Result<(), WebError> {
    if is_mounted() {
        return Ok(());
    }
    let document = dom::document().ok_or(WebError::Missing("document"))?;
    let reader_listener = Closure::wrap(Box::new(|event: Event| on_reader_click(&event))
        as Box<dyn FnMut(Event)>);
    let engine = ToggleEngine::new(
        config,
        BrowserStorage::local(),
        DomSurface::new(document, reader_listener),
        BrowserSpeech::detect(),
    );
    WIDGET.with(|cell| {
        *cell.borrow_mut() = Some(Widget {
            engine,
            dropdown: Dropdown::default(),
            links: Vec::new(),
            cursor: LinkCursor::default(),
        });
    });

    with_widget(|widget| {
        let report = widget.engine.restore();
        if report.recovered {
            log::warn!("stored accessibility settings were unreadable and have been reset");
        }
        sync_speech_controls(report.speech);
        refresh_links(widget);
        apply_layout(widget);
        render_dropdown(&widget.dropdown);
    });
    bind_controls()?;
    log::info!("accessibility widget ready");
    Ok(())
}

/// Perform a keyboard or API action.
pub fn dispatch(widget: &mut Widget, action: Action) {
    let engine = &mut widget.engine;
    match action {
        Action::Toggle(feature) => engine.toggle(feature),
        Action::IncreaseFont => {
            engine.increase_font();
        }
        Action::DecreaseFont => {
            engine.decrease_font();
        }
        Action::ResetFont => engine.reset_font(),
        Action::ToggleScreenReader => engine.toggle_screen_reader(),
        Action::ReadPage => read_page(widget),
        Action::ToggleMenu => {
            widget.dropdown.toggle();
            render_dropdown(&widget.dropdown);
        }
        Action::ResetAll => {
            engine.reset_all();
            sync_speech_controls(engine.speech_preferences());
        }
        Action::ScrollDown => scroll_by(SCROLL_STEP_PX),
        Action::ScrollUp => scroll_by(-SCROLL_STEP_PX),
        Action::NextLink | Action::PreviousLink => focus_link(widget, action),
    }
}

/// Read the whole page. Only available while the screen reader is on.
pub fn read_page(widget: &mut Widget) {
    if !widget.engine.state().screen_reader {
        return;
    }
    let Some(document) = dom::document() else {
        return;
    };
    let fragments = reader::page_fragments(&document, &widget.engine.config().exclusion_markers);
    widget.engine.read_entire_page(&document.title(), &fragments);
}

fn on_reader_click(event: &Event) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let click = reader::click_target(&target);
    let disposition = with_widget(|widget| widget.engine.handle_click(&click));
    if let Some(disposition) = disposition
        && disposition.suppresses_default()
    {
        event.prevent_default();
        if let ClickDisposition::Read(text) = disposition {
            log::debug!("read: {text}");
        }
    }
}

fn flush_notice() {
    let notify = WIDGET.with(|cell| {
        cell.try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.as_mut().map(|w| w.engine.take_unsupported_notice()))
            .unwrap_or(false)
    });
    if notify {
        show_notice(UNSUPPORTED_NOTICE);
    }
}

/// Transient overlay message, removed after a few seconds.
pub fn show_notice(message: &str) {
    let (Some(document), Some(body)) = (dom::document(), dom::body()) else {
        return;
    };
    let Ok(toast) = document.create_element("div") else {
        return;
    };
    toast.set_class_name(ids::TOAST_MARKER);
    let _ = toast.set_attribute("role", "status");
    toast.set_text_content(Some(message));
    if body.append_child(&toast).is_err() {
        return;
    }
    let remove = Closure::once(move || toast.remove());
    if let Some(win) = dom::window() {
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            remove.as_ref().unchecked_ref(),
            NOTICE_MS,
        );
    }
    remove.forget();
}

// Dropdown ----------------------------------------------------------------

fn render_dropdown(dropdown: &Dropdown) {
    dom::set_class_on(ids::MENU_DROPDOWN, ids::SHOW_CLASS, dropdown.is_open());
    dom::set_class_on(
        ids::MENU_DROPDOWN,
        ids::TWO_COLUMN_CLASS,
        dropdown.layout() == MenuLayout::TwoColumn,
    );
    if let Some(toggle) = bindable(ids::MENU_TOGGLE) {
        let expanded = if dropdown.is_open() { "true" } else { "false" };
        let _ = toggle.set_attribute("aria-expanded", expanded);
    }
    let panel_open = dropdown.speech_panel_open();
    if let Some(panel) = dom::by_id(ids::SPEECH_CONTROLS)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let display = if panel_open { "block" } else { "none" };
        let _ = panel.style().set_property("display", display);
    }
    dom::set_class_on(ids::SPEECH_SETTINGS_BTN, ids::ACTIVE_CLASS, panel_open);
}

fn apply_layout(widget: &mut Widget) {
    let config = widget.engine.config();
    if !config.two_column_layout {
        return;
    }
    let width = dom::window()
        .and_then(|win| win.inner_width().ok())
        .and_then(|w| w.as_f64())
        .unwrap_or_default();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let layout = config.layout_for_width(width.max(0.0) as u32);
    if widget.dropdown.set_layout(layout) {
        log::debug!("menu layout: {layout:?}");
        render_dropdown(&widget.dropdown);
    }
}

fn on_resize() {
    let Some(win) = dom::window() else {
        return;
    };
    if let Some(pending) = RESIZE_TIMER.with(Cell::take) {
        win.clear_timeout_with_handle(pending);
    }
    let Some(delay) = with_widget(|w| w.engine.config().resize_debounce_ms) else {
        return;
    };
    let fire = Closure::once(|| {
        RESIZE_TIMER.with(|t| t.set(None));
        with_widget(apply_layout);
    });
    let handle = win.set_timeout_with_callback_and_timeout_and_arguments_0(
        fire.as_ref().unchecked_ref(),
        i32::try_from(delay).unwrap_or(i32::MAX),
    );
    fire.forget();
    if let Ok(handle) = handle {
        RESIZE_TIMER.with(|t| t.set(Some(handle)));
    }
}

fn on_menu_toggle(event: &Event) {
    event.stop_propagation();
    let guard_ms = with_widget(|widget| {
        widget.dropdown.on_toggle_click();
        render_dropdown(&widget.dropdown);
        widget.engine.config().dropdown_guard_ms
    });
    let (Some(guard_ms), Some(win)) = (guard_ms, dom::window()) else {
        return;
    };
    let release = Closure::once(|| {
        with_widget(|widget| widget.dropdown.release_guard());
    });
    let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
        release.as_ref().unchecked_ref(),
        i32::try_from(guard_ms).unwrap_or(i32::MAX),
    );
    release.forget();
}

fn on_document_click(event: &Event) {
    let inside = event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(&format!(".{}", ids::WIDGET_MARKER)).ok().flatten())
        .is_some();
    if inside {
        return;
    }
    with_widget(|widget| {
        if widget.dropdown.on_outside_click() {
            render_dropdown(&widget.dropdown);
        }
    });
}

// Keyboard ----------------------------------------------------------------

fn is_editing(target: Option<Element>) -> bool {
    let Some(el) = target else {
        return false;
    };
    let tag = el.tag_name().to_ascii_lowercase();
    if matches!(tag.as_str(), "input" | "textarea" | "select") {
        return true;
    }
    el.dyn_ref::<HtmlElement>()
        .is_some_and(HtmlElement::is_content_editable)
}

fn on_keydown(event: &Event) {
    let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
        return;
    };
    if event.key() == "Escape" {
        with_widget(|widget| {
            if widget.dropdown.on_key("Escape") {
                render_dropdown(&widget.dropdown);
            }
        });
        return;
    }
    let Some(key) = key_from_code(&event.code()) else {
        return;
    };
    let editing = is_editing(dom::document().and_then(|doc| doc.active_element()));
    let input = KeyInput {
        key,
        alt: event.alt_key(),
        ctrl: event.ctrl_key(),
        meta: event.meta_key(),
        editing,
    };
    let Some(action) = resolve(input) else {
        return;
    };
    event.prevent_default();
    with_widget(|widget| dispatch(widget, action));
}

fn scroll_by(dy: f64) {
    if let Some(win) = dom::window() {
        win.scroll_by_with_x_and_y(0.0, dy);
    }
}

fn collect_links() -> Vec<HtmlElement> {
    let Some(document) = dom::document() else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all("a[href]") else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
        .filter(|el| {
            el.closest(&format!(".{}", ids::WIDGET_MARKER))
                .ok()
                .flatten()
                .is_none()
        })
        .collect()
}

/// Recompute the keyboard link list. Runs at mount; pages that swap
/// content call it again through `refreshAccessibilityLinks`.
pub fn refresh_links(widget: &mut Widget) {
    widget.links = collect_links();
    widget.cursor.set_len(widget.links.len());
}

#[must_use]
pub fn link_count(widget: &Widget) -> usize {
    widget.links.len()
}

fn focus_link(widget: &mut Widget, action: Action) {
    let index = if action == Action::PreviousLink {
        widget.cursor.previous()
    } else {
        widget.cursor.next()
    };
    if let Some(link) = index.and_then(|i| widget.links.get(i)) {
        let _ = link.focus();
    }
}

// Speech settings -----------------------------------------------------------

fn slider(id: &str) -> Option<HtmlInputElement> {
    dom::by_id(id).and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
}

fn sync_speech_controls(prefs: SpeechPreferences) {
    if let Some(rate) = slider(ids::SPEECH_RATE) {
        rate.set_value(&prefs.rate.to_string());
    }
    if let Some(volume) = slider(ids::SPEECH_VOLUME) {
        volume.set_value(&prefs.volume.to_string());
    }
    if let Some(label) = dom::by_id(ids::RATE_VALUE) {
        label.set_text_content(Some(&format!("{:.1}x", prefs.rate)));
    }
    if let Some(label) = dom::by_id(ids::VOLUME_VALUE) {
        label.set_text_content(Some(&format!("{:.0}%", prefs.volume * 100.0)));
    }
}

/// Store whatever the rate and volume sliders currently show.
pub fn apply_speech_sliders() {
    let read = |id: &str, fallback: f64| {
        slider(id)
            .map(|el| el.value_as_number())
            .filter(|v| v.is_finite())
            .unwrap_or(fallback)
    };
    let prefs = with_widget(|widget| {
        let current = widget.engine.speech_preferences();
        widget.engine.update_speech(
            read(ids::SPEECH_RATE, current.rate),
            read(ids::SPEECH_VOLUME, current.volume),
        )
    });
    if let Some(prefs) = prefs {
        sync_speech_controls(prefs);
    }
}

pub fn on_speech_panel(event: &Event) {
    event.stop_propagation();
    with_widget(|widget| {
        widget.dropdown.toggle_speech_panel();
        render_dropdown(&widget.dropdown);
    });
}

// Binding -------------------------------------------------------------------

fn listen(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), WebError> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    LISTENERS.with(|l| l.borrow_mut().push(closure));
    Ok(())
}

/// Controls with an inline `onclick` already reach the widget through the
/// global exports; a second listener would run every action twice.
fn has_inline_handler(el: &Element) -> bool {
    el.has_attribute("onclick")
}

/// The element for `id`, unless it is missing or wired inline.
fn bindable(id: &str) -> Option<Element> {
    let el = dom::by_id(id)?;
    if has_inline_handler(&el) {
        log::debug!("#{id} uses an inline handler; not binding");
        return None;
    }
    Some(el)
}

fn on_click(id: &str, action: Action) -> Result<(), WebError> {
    let Some(el) = bindable(id) else {
        return Ok(());
    };
    listen(&el, "click", move |_| {
        with_widget(|widget| dispatch(widget, action));
    })
}

fn bind_controls() -> Result<(), WebError> {
    let document = dom::document().ok_or(WebError::Missing("document"))?;
    let window = dom::window().ok_or(WebError::Missing("window"))?;

    if let Some(toggle) = dom::by_id(ids::MENU_TOGGLE) {
        listen(&toggle, "click", |event| on_menu_toggle(&event))?;
    }
    listen(&document, "click", |event| on_document_click(&event))?;
    listen(&document, "keydown", |event| on_keydown(&event))?;
    listen(&window, "resize", |_| on_resize())?;

    for feature in Feature::ALL {
        on_click(feature.indicator_id(), Action::Toggle(feature))?;
    }
    on_click(ids::FONT_INCREASE_BTN, Action::IncreaseFont)?;
    on_click(ids::FONT_DECREASE_BTN, Action::DecreaseFont)?;
    on_click(ids::FONT_NORMAL_BTN, Action::ResetFont)?;
    on_click(ids::SCREEN_READER_BTN, Action::ToggleScreenReader)?;
    on_click(ids::READ_PAGE_BTN, Action::ReadPage)?;
    on_click(ids::RESET_BTN, Action::ResetAll)?;

    if let Some(btn) = bindable(ids::SPEECH_SETTINGS_BTN) {
        listen(&btn, "click", |event| on_speech_panel(&event))?;
    }
    if let Some(panel) = dom::by_id(ids::SPEECH_CONTROLS) {
        listen(&panel, "click", |event| event.stop_propagation())?;
    }
    for id in [ids::SPEECH_RATE, ids::SPEECH_VOLUME] {
        if let Some(input) = dom::by_id(id) {
            listen(&input, "input", |_| apply_speech_sliders())?;
        }
    }
    if let Some(btn) = bindable(ids::TEST_SPEECH_BTN) {
        listen(&btn, "click", |event| {
            event.stop_propagation();
            with_widget(|widget| widget.engine.test_speech());
        })?;
    }
    Ok(())
}
