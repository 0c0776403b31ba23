use accessibility_core::headless::{HeadlessSurface, MemoryStore, RecordingSynth};
use accessibility_core::{
    ACCESSIBILITY_KEY, AccessibilityPreferences, ContrastPolicy, Feature, PageSurface,
    SPEECH_KEY, ToggleEngine, WidgetConfig,
};
use serde_json::Value;

type Engine = ToggleEngine<MemoryStore, HeadlessSurface, RecordingSynth>;

fn page_load(config: &WidgetConfig, store: &MemoryStore) -> Engine {
    let mut engine = ToggleEngine::new(
        config.clone(),
        store.clone(),
        HeadlessSurface::default(),
        RecordingSynth::default(),
    );
    engine.restore();
    engine
}

fn stored_record(store: &MemoryStore) -> Value {
    serde_json::from_str(&store.raw(ACCESSIBILITY_KEY).expect("record present")).unwrap()
}

#[test]
fn high_contrast_survives_reload() {
    let config = WidgetConfig::default();
    let store = MemoryStore::default();

    let mut engine = page_load(&config, &store);
    engine.toggle(Feature::HighContrast);
    assert_eq!(stored_record(&store)["highContrast"], true);

    let reloaded = page_load(&config, &store);
    assert!(reloaded.is_enabled(Feature::HighContrast));
    assert!(reloaded.surface().indicator_active("contrastBtn"));
    assert_eq!(
        reloaded.snapshot().enabled_features(),
        vec![Feature::HighContrast]
    );
    assert_eq!(reloaded.state().font.increase_level(), 0);
    assert_eq!(reloaded.state().font.decrease_level(), 0);
    assert!(!reloaded.state().screen_reader);
    for feature in Feature::ALL {
        if feature != Feature::HighContrast {
            assert!(!reloaded.surface().has_marker(feature.marker()), "{feature:?}");
        }
    }
}

#[test]
fn every_save_writes_the_complete_record() {
    let config = WidgetConfig::default();
    let store = MemoryStore::default();
    let mut engine = page_load(&config, &store);

    engine.decrease_font();
    let record = stored_record(&store);
    let keys: Vec<&str> = record
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for key in [
        "fontIncreaseLevel",
        "fontDecreaseLevel",
        "highContrast",
        "invertColors",
        "saturateColors",
        "highlightLinks",
        "textSpacing",
        "lineHeight",
        "hideImages",
        "screenReader",
    ] {
        assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(record["fontDecreaseLevel"], 1);
}

#[test]
fn restored_record_matches_what_was_saved() {
    let config = WidgetConfig::default();
    let store = MemoryStore::default();
    let mut engine = page_load(&config, &store);
    engine.toggle(Feature::InvertColors);
    engine.toggle(Feature::LineHeight);
    engine.increase_font();
    engine.increase_font();
    engine.increase_font();
    engine.toggle_screen_reader();
    let saved = engine.snapshot();

    let reloaded = page_load(&config, &store);
    assert_eq!(reloaded.snapshot(), saved);
    assert_eq!(reloaded.surface().indicator_text("fontIncreaseLevel"), Some("3"));
    assert!(reloaded.surface().control_visible("readPageBtn"));
    assert!(reloaded.narrator().synth().spoken().is_empty());
}

#[test]
fn legacy_record_with_both_levels_restores_increase_only() {
    let store = MemoryStore::default();
    store.insert_raw(
        ACCESSIBILITY_KEY,
        r#"{"fontIncreaseLevel":2,"fontDecreaseLevel":1,"hideImages":true}"#,
    );
    let engine = page_load(&WidgetConfig::default(), &store);
    assert_eq!(engine.state().font.increase_level(), 2);
    assert_eq!(engine.state().font.decrease_level(), 0);
    assert!(engine.is_enabled(Feature::HideImages));
}

#[test]
fn malformed_speech_record_wipes_both_keys() {
    let store = MemoryStore::default();
    let prefs = AccessibilityPreferences {
        text_spacing: true,
        ..AccessibilityPreferences::default()
    };
    store.insert_raw(ACCESSIBILITY_KEY, &serde_json::to_string(&prefs).unwrap());
    store.insert_raw(SPEECH_KEY, "rate=fast");

    let engine = page_load(&WidgetConfig::default(), &store);
    assert!(store.raw(ACCESSIBILITY_KEY).is_none());
    assert!(store.raw(SPEECH_KEY).is_none());
    assert!(!engine.is_enabled(Feature::TextSpacing));
}

#[test]
fn exclusive_policy_replays_a_filter_enabled_after_contrast() {
    let config = WidgetConfig {
        contrast_policy: ContrastPolicy::ExclusiveHighContrast,
        ..WidgetConfig::default()
    };
    let store = MemoryStore::default();
    let mut engine = page_load(&config, &store);
    engine.toggle(Feature::HighContrast);
    engine.toggle(Feature::InvertColors);
    let saved = engine.snapshot();
    assert!(saved.high_contrast && saved.invert_colors);

    let reloaded = page_load(&config, &store);
    assert_eq!(reloaded.snapshot(), saved);
}
