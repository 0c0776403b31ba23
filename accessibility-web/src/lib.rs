#![forbid(unsafe_code)]
//! Browser bindings for the accessibility controls widget.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod api;
pub mod dom;
pub mod error;
pub mod logging;
pub mod reader;
pub mod speech;
pub mod storage;
pub mod surface;
pub mod test_bridge;
pub mod widget;

pub use error::WebError;

/// Mount the widget from the page's inline configuration and, in test
/// mode, install the automation bridge.
pub fn boot() {
    if let Err(err) = widget::mount(widget::read_config()) {
        dom::console_error(&format!("accessibility widget failed to start: {err}"));
        return;
    }
    test_bridge::install();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
    let Some(document) = dom::document() else {
        return;
    };
    if document.ready_state() != "loading" {
        boot();
        return;
    }
    let on_ready = Closure::once(boot);
    let _ = document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref());
    on_ready.forget();
}
