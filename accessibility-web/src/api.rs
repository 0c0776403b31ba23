//! Global functions for pages that drive the widget from inline handlers.
use accessibility_core::{Action, Feature};
use wasm_bindgen::prelude::*;

use crate::widget::{self, dispatch};

fn run(action: Action) {
    widget::with_widget(|w| dispatch(w, action));
}

#[wasm_bindgen(js_name = toggleHighContrast)]
pub fn toggle_high_contrast() {
    run(Action::Toggle(Feature::HighContrast));
}

#[wasm_bindgen(js_name = toggleInvert)]
pub fn toggle_invert() {
    run(Action::Toggle(Feature::InvertColors));
}

#[wasm_bindgen(js_name = toggleSaturation)]
pub fn toggle_saturation() {
    run(Action::Toggle(Feature::SaturateColors));
}

#[wasm_bindgen(js_name = toggleHighlightLinks)]
pub fn toggle_highlight_links() {
    run(Action::Toggle(Feature::HighlightLinks));
}

#[wasm_bindgen(js_name = toggleTextSpacing)]
pub fn toggle_text_spacing() {
    run(Action::Toggle(Feature::TextSpacing));
}

#[wasm_bindgen(js_name = toggleLineHeight)]
pub fn toggle_line_height() {
    run(Action::Toggle(Feature::LineHeight));
}

#[wasm_bindgen(js_name = toggleHideImages)]
pub fn toggle_hide_images() {
    run(Action::Toggle(Feature::HideImages));
}

#[wasm_bindgen(js_name = increaseFontSize)]
pub fn increase_font_size() {
    run(Action::IncreaseFont);
}

#[wasm_bindgen(js_name = decreaseFontSize)]
pub fn decrease_font_size() {
    run(Action::DecreaseFont);
}

#[wasm_bindgen(js_name = resetFontSize)]
pub fn reset_font_size() {
    run(Action::ResetFont);
}

#[wasm_bindgen(js_name = toggleScreenReader)]
pub fn toggle_screen_reader() {
    run(Action::ToggleScreenReader);
}

#[wasm_bindgen(js_name = readEntirePage)]
pub fn read_entire_page() {
    run(Action::ReadPage);
}

#[wasm_bindgen(js_name = toggleDropdown)]
pub fn toggle_dropdown() {
    run(Action::ToggleMenu);
}

#[wasm_bindgen(js_name = resetAllSettings)]
pub fn reset_all_settings() {
    run(Action::ResetAll);
}

#[wasm_bindgen(js_name = testSpeech)]
pub fn test_speech() {
    widget::with_widget(|w| w.engine.test_speech());
}

/// Store the current slider positions, as `onchange="updateSpeechSettings()"`.
#[wasm_bindgen(js_name = updateSpeechSettings)]
pub fn update_speech_settings() {
    widget::apply_speech_sliders();
}

#[wasm_bindgen(js_name = toggleSpeechSettings)]
pub fn toggle_speech_settings(event: web_sys::Event) {
    widget::on_speech_panel(&event);
}

#[wasm_bindgen(js_name = refreshAccessibilityLinks)]
pub fn refresh_accessibility_links() {
    widget::with_widget(widget::refresh_links);
}
