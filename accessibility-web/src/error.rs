//! Errors raised at the browser boundary.
use wasm_bindgen::JsValue;

use crate::dom::js_error_message;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebError {
    #[error("browser global `{0}` is unavailable")]
    Missing(&'static str),
    #[error("JavaScript error: {0}")]
    Js(String),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        Self::Js(js_error_message(&value))
    }
}
