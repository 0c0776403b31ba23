use accessibility_core::{Action, Feature};
use accessibility_web::WebError;
use accessibility_web::dom::parse_px;
use accessibility_web::speech::preferred_voice;
use accessibility_web::test_bridge::bridge_action;

#[test]
fn computed_font_sizes_parse_as_pixels() {
    assert_eq!(parse_px("16px"), Some(16.0));
    assert_eq!(parse_px("NaNpx"), None);
    assert_eq!(parse_px("100%"), None);
}

#[test]
fn voice_choice_requires_english() {
    let voices = [("Google español", "es-ES"), ("Google US English", "en-US")];
    assert_eq!(preferred_voice(voices), Some(1));
    assert_eq!(preferred_voice([("Samantha", "en-US")]), None);
}

#[test]
fn bridge_key_codes_match_alt_shortcuts() {
    assert_eq!(
        bridge_action("KeyG", true),
        Some(Action::Toggle(Feature::HideImages))
    );
    assert_eq!(bridge_action("Equal", true), Some(Action::IncreaseFont));
    assert_eq!(bridge_action("KeyX", false), None);
}

#[test]
fn web_errors_describe_missing_globals() {
    let err = WebError::Missing("localStorage");
    assert_eq!(err.to_string(), "browser global `localStorage` is unavailable");
}
