//! The toggle engine: every live mutation and the apply-on-load replay go
//! through the same operations here.
use serde::Serialize;

use crate::config::{ContrastPolicy, WidgetConfig};
use crate::error::StoreError;
use crate::feature::{Feature, FeatureState, ids};
use crate::font_scale::{FontBaseline, FontScale, ScaleMechanism};
use crate::prefs::{AccessibilityPreferences, SpeechPreferences};
use crate::screen_reader::{
    ClickDisposition, ClickTarget, ExclusionRules, PageFragment, compose_page_reading,
    readable_text,
};
use crate::speech::{
    ACTIVATED_ANNOUNCEMENT, DEACTIVATED_ANNOUNCEMENT, Narrator, SpeakOutcome, SpeechSynth,
    TEST_SENTENCE,
};
use crate::store::{KeyValueStore, PreferenceStore};
use crate::surface::PageSurface;

/// Transient state the engine owns between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineState {
    pub font: FontScale,
    pub screen_reader: bool,
    pub mechanism: ScaleMechanism,
}

/// Outcome of the startup restore sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub preferences: AccessibilityPreferences,
    pub speech: SpeechPreferences,
    /// The store held unreadable data and was wiped.
    pub recovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announce {
    Spoken,
    Silent,
}

pub struct ToggleEngine<K, P, S> {
    config: WidgetConfig,
    store: PreferenceStore<K>,
    surface: P,
    narrator: Narrator<S>,
    exclusions: ExclusionRules,
    baseline: FontBaseline,
    state: EngineState,
}

impl<K, P, S> ToggleEngine<K, P, S>
where
    K: KeyValueStore,
    P: PageSurface,
    S: SpeechSynth,
{
    pub fn new(config: WidgetConfig, backend: K, surface: P, synth: S) -> Self {
        let store =
            PreferenceStore::new(backend).with_speech_defaults(config.speech_preset.defaults());
        let mechanism = surface.detect_scale_mechanism();
        log::debug!("font scaling via {mechanism:?}");
        Self {
            exclusions: ExclusionRules::from_config(&config),
            state: EngineState {
                font: FontScale::new(config.max_font_level),
                screen_reader: false,
                mechanism,
            },
            config,
            store,
            surface,
            narrator: Narrator::new(synth),
            baseline: FontBaseline::default(),
        }
    }

    pub const fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub const fn state(&self) -> &EngineState {
        &self.state
    }

    pub const fn store(&self) -> &PreferenceStore<K> {
        &self.store
    }

    pub const fn surface(&self) -> &P {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    pub const fn narrator(&self) -> &Narrator<S> {
        &self.narrator
    }

    pub const fn baseline(&self) -> &FontBaseline {
        &self.baseline
    }

    // Boolean features ----------------------------------------------------

    #[must_use]
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.surface.has_marker(feature.marker())
    }

    /// Flip a boolean feature, re-derive indicators and persist the full
    /// record.
    pub fn toggle(&mut self, feature: Feature) {
        let enable = !self.is_enabled(feature);
        if feature == Feature::HighContrast
            && self.config.contrast_policy == ContrastPolicy::ExclusiveHighContrast
        {
            self.apply_marker(Feature::InvertColors, false);
            self.apply_marker(Feature::SaturateColors, false);
        }
        self.apply_marker(feature, enable);
        log::debug!("{} -> {enable}", feature.marker());
        self.refresh_indicators();
        self.persist();
    }

    fn apply_marker(&mut self, feature: Feature, enabled: bool) {
        if feature.is_color_filter() {
            self.surface
                .set_page_filter(feature.marker(), enabled, self.config.filter_scope);
        } else {
            self.surface.set_marker(feature.marker(), enabled);
        }
    }

    // Font scale ----------------------------------------------------------

    pub fn increase_font(&mut self) -> bool {
        let changed = self.state.font.increase();
        if changed {
            self.font_changed();
        }
        changed
    }

    pub fn decrease_font(&mut self) -> bool {
        let changed = self.state.font.decrease();
        if changed {
            self.font_changed();
        }
        changed
    }

    pub fn reset_font(&mut self) {
        self.state.font.reset();
        self.font_changed();
    }

    fn font_changed(&mut self) {
        self.apply_font_scale();
        self.refresh_indicators();
        self.persist();
    }

    fn apply_font_scale(&mut self) {
        let font = self.state.font;
        let factor = font.factor(self.config.font_scale_step);
        match self.state.mechanism {
            ScaleMechanism::Zoom => {
                self.surface.apply_zoom(font.is_scaled().then_some(factor));
            }
            ScaleMechanism::RootFontSize => {
                let surface = &self.surface;
                let baseline = self
                    .baseline
                    .get_or_capture(|| surface.computed_root_font_size());
                let size = font
                    .is_scaled()
                    .then(|| baseline.map(|px| px * factor))
                    .flatten();
                self.surface.set_root_font_size(size);
            }
        }
    }

    // Screen reader -------------------------------------------------------

    pub fn toggle_screen_reader(&mut self) {
        let next = !self.state.screen_reader;
        self.set_screen_reader(next, Announce::Spoken);
        self.refresh_indicators();
        self.persist();
    }

    fn set_screen_reader(&mut self, active: bool, announce: Announce) {
        self.state.screen_reader = active;
        if active {
            self.surface.attach_reader_listener();
            if announce == Announce::Spoken {
                self.speak(ACTIVATED_ANNOUNCEMENT);
            }
        } else {
            self.narrator.stop();
            self.surface.detach_reader_listener();
            if announce == Announce::Spoken {
                self.speak(DEACTIVATED_ANNOUNCEMENT);
            }
        }
    }

    /// Consult the reader for a click delivered by the delegated listener.
    pub fn handle_click(&mut self, target: &ClickTarget) -> ClickDisposition {
        if !self.state.screen_reader {
            return ClickDisposition::Inactive;
        }
        if self.exclusions.excludes(target) {
            return ClickDisposition::Excluded;
        }
        let text = readable_text(target);
        if text.trim().is_empty() {
            return ClickDisposition::Silent;
        }
        self.speak(&text);
        ClickDisposition::Read(text)
    }

    /// Speak the whole page as one utterance.
    pub fn read_entire_page(&mut self, title: &str, fragments: &[PageFragment]) -> SpeakOutcome {
        let content = compose_page_reading(title, fragments, self.config.read_page_min_length);
        self.speak(&content)
    }

    /// Speak with the speech parameters stored at this moment.
    pub fn speak(&mut self, text: &str) -> SpeakOutcome {
        let prefs = self.store.speech();
        self.narrator.speak(text, prefs)
    }

    pub fn test_speech(&mut self) -> SpeakOutcome {
        self.speak(TEST_SENTENCE)
    }

    /// See [`Narrator::take_unsupported_notice`].
    pub const fn take_unsupported_notice(&mut self) -> bool {
        self.narrator.take_unsupported_notice()
    }

    pub fn stop_speaking(&mut self) {
        self.narrator.stop();
    }

    /// Store new slider values. Utterances already playing keep their
    /// parameters. A non-finite value keeps the stored one.
    pub fn update_speech(&mut self, rate: f64, volume: f64) -> SpeechPreferences {
        let prefs = SpeechPreferences { rate, volume }.clamped(self.store.speech());
        if let Err(err) = self.store.save(&prefs) {
            log::warn!("could not save speech settings: {err}");
        }
        prefs
    }

    pub fn speech_preferences(&self) -> SpeechPreferences {
        self.store.speech()
    }

    // Persistence ---------------------------------------------------------

    /// The full record as derived from live state.
    #[must_use]
    pub fn snapshot(&self) -> AccessibilityPreferences {
        let mut prefs = AccessibilityPreferences {
            font_increase_level: self.state.font.increase_level(),
            font_decrease_level: self.state.font.decrease_level(),
            screen_reader: self.state.screen_reader,
            ..AccessibilityPreferences::default()
        };
        for feature in Feature::ALL {
            prefs.set_enabled(feature, self.is_enabled(feature));
        }
        prefs
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.snapshot()) {
            log::warn!("could not save accessibility settings: {err}");
        }
    }

    /// Read both records and replay them through the live operations. Any
    /// unreadable data wipes the store and continues from defaults.
    pub fn restore(&mut self) -> RestoreReport {
        let loaded = self.load_records();
        let (preferences, speech, recovered) = match loaded {
            Ok((prefs, speech)) => (prefs, speech, false),
            Err(err) => {
                log::warn!("error loading accessibility settings, resetting: {err}");
                self.store.clear_all();
                (
                    AccessibilityPreferences::default(),
                    self.store.speech_defaults(),
                    true,
                )
            }
        };
        self.replay(&preferences);
        RestoreReport {
            preferences,
            speech,
            recovered,
        }
    }

    fn load_records(&self) -> Result<(AccessibilityPreferences, SpeechPreferences), StoreError> {
        let prefs = self
            .store
            .try_load::<AccessibilityPreferences>()?
            .unwrap_or_default();
        let speech = self
            .store
            .try_load::<SpeechPreferences>()?
            .map_or_else(|| self.store.speech_defaults(), |s| {
                s.clamped(self.store.speech_defaults())
            });
        Ok((prefs, speech))
    }

    fn replay(&mut self, prefs: &AccessibilityPreferences) {
        if prefs.font_increase_level > 0 {
            for _ in 0..prefs.font_increase_level {
                if !self.increase_font() {
                    break;
                }
            }
        } else {
            for _ in 0..prefs.font_decrease_level {
                if !self.decrease_font() {
                    break;
                }
            }
        }
        for feature in prefs.enabled_features() {
            if !self.is_enabled(feature) {
                self.toggle(feature);
            }
        }
        if prefs.screen_reader && !self.state.screen_reader {
            self.set_screen_reader(true, Announce::Silent);
            self.persist();
        }
        self.refresh_indicators();
    }

    /// Clear every feature, stop the reader silently and delete the display
    /// record. Speech settings are kept.
    pub fn reset_all(&mut self) {
        self.state.font.reset();
        self.apply_font_scale();
        for feature in Feature::ALL {
            self.apply_marker(feature, false);
        }
        if self.state.screen_reader {
            self.set_screen_reader(false, Announce::Silent);
        }
        self.refresh_indicators();
        if let Err(err) = self.store.clear::<AccessibilityPreferences>() {
            log::warn!("could not clear accessibility settings: {err}");
        }
    }

    // Indicators ----------------------------------------------------------

    /// Re-derive every indicator from live state.
    pub fn refresh_indicators(&mut self) {
        for feature in Feature::ALL {
            let active = self.is_enabled(feature);
            self.surface
                .set_indicator_active(feature.indicator_id(), active);
        }
        let font = self.state.font;
        self.surface.set_indicator_text(
            ids::FONT_INCREASE_LEVEL,
            &FontScale::badge(font.increase_level()),
        );
        self.surface.set_indicator_text(
            ids::FONT_DECREASE_LEVEL,
            &FontScale::badge(font.decrease_level()),
        );
        self.surface
            .set_indicator_active(ids::FONT_INCREASE_BTN, font.increase_level() > 0);
        self.surface
            .set_indicator_active(ids::FONT_DECREASE_BTN, font.decrease_level() > 0);
        self.surface
            .set_indicator_active(ids::SCREEN_READER_BTN, self.state.screen_reader);
        self.surface
            .set_control_visible(ids::READ_PAGE_BTN, self.state.screen_reader);
    }

    /// Live state of every feature, booleans first.
    #[must_use]
    pub fn feature_states(&self) -> Vec<FeatureState> {
        let mut states: Vec<FeatureState> = Feature::ALL
            .into_iter()
            .map(|f| FeatureState::boolean(f.marker(), self.is_enabled(f)))
            .collect();
        states.push(FeatureState::boolean(
            "screen-reader",
            self.state.screen_reader,
        ));
        states.push(FeatureState::level(
            "font-increase",
            self.state.font.increase_level(),
        ));
        states.push(FeatureState::level(
            "font-decrease",
            self.state.font.decrease_level(),
        ));
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterScope;
    use crate::headless::{HeadlessSurface, MemoryStore, RecordingSynth};
    use crate::prefs::{ACCESSIBILITY_KEY, SPEECH_KEY};
    use crate::screen_reader::ElementKind;

    type Engine = ToggleEngine<MemoryStore, HeadlessSurface, RecordingSynth>;

    fn engine_with(config: WidgetConfig, store: MemoryStore) -> Engine {
        ToggleEngine::new(
            config,
            store,
            HeadlessSurface::default(),
            RecordingSynth::default(),
        )
    }

    fn engine() -> (Engine, MemoryStore) {
        let store = MemoryStore::default();
        (engine_with(WidgetConfig::default(), store.clone()), store)
    }

    #[test]
    fn toggle_flips_marker_indicator_and_saves_full_record() {
        let (mut engine, store) = engine();
        engine.toggle(Feature::TextSpacing);
        assert!(engine.surface().has_marker("text-spacing"));
        assert!(engine.surface().indicator_active("textSpacingBtn"));
        let raw = store.raw(ACCESSIBILITY_KEY).expect("record saved");
        let saved: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.as_object().unwrap().len(), 10);
        assert_eq!(saved["textSpacing"], true);

        engine.toggle(Feature::TextSpacing);
        assert!(!engine.surface().indicator_active("textSpacingBtn"));
        assert!(engine.store().accessibility().is_default());
    }

    #[test]
    fn independent_policy_keeps_filters_alongside_contrast() {
        let (mut engine, _) = engine();
        engine.toggle(Feature::InvertColors);
        engine.toggle(Feature::HighContrast);
        assert!(engine.is_enabled(Feature::InvertColors));
        assert!(engine.is_enabled(Feature::HighContrast));
    }

    #[test]
    fn exclusive_policy_clears_filters() {
        let config = WidgetConfig {
            contrast_policy: ContrastPolicy::ExclusiveHighContrast,
            ..WidgetConfig::default()
        };
        let mut engine = engine_with(config, MemoryStore::default());
        engine.toggle(Feature::InvertColors);
        engine.toggle(Feature::SaturateColors);
        engine.toggle(Feature::HighContrast);
        assert!(engine.is_enabled(Feature::HighContrast));
        assert!(!engine.is_enabled(Feature::InvertColors));
        assert!(!engine.is_enabled(Feature::SaturateColors));
        assert!(!engine.surface().indicator_active("invertBtn"));

        engine.toggle(Feature::InvertColors);
        engine.toggle(Feature::HighContrast);
        assert!(!engine.is_enabled(Feature::InvertColors));
        assert!(engine.snapshot().is_default());
    }

    #[test]
    fn color_filters_follow_configured_scope() {
        let (mut engine, _) = engine();
        engine.toggle(Feature::InvertColors);
        assert!(engine.surface().sibling_filter("invert-colors"));
        assert!(!engine.surface().body_markers().contains(&"invert-colors"));

        let config = WidgetConfig {
            filter_scope: FilterScope::Body,
            ..WidgetConfig::default()
        };
        let mut body_engine = engine_with(config, MemoryStore::default());
        body_engine.toggle(Feature::SaturateColors);
        assert!(body_engine.surface().body_markers().contains(&"saturate-colors"));
    }

    #[test]
    fn font_transitions_update_zoom_badges_and_buttons() {
        let (mut engine, _) = engine();
        engine.increase_font();
        engine.increase_font();
        let zoom = engine.surface().zoom().unwrap();
        assert!((zoom - 1.21).abs() < 1e-9);
        assert_eq!(engine.surface().indicator_text("fontIncreaseLevel"), Some("2"));
        assert!(engine.surface().indicator_active("fontIncreaseBtn"));

        engine.decrease_font();
        assert_eq!(engine.surface().indicator_text("fontIncreaseLevel"), Some(""));
        assert_eq!(engine.surface().indicator_text("fontDecreaseLevel"), Some("1"));
        assert!(!engine.surface().indicator_active("fontIncreaseBtn"));
        assert!(engine.surface().indicator_active("fontDecreaseBtn"));

        engine.reset_font();
        assert_eq!(engine.surface().zoom(), None);
        engine.reset_font();
        assert_eq!(engine.surface().zoom(), None);
        assert!(!engine.state().font.is_scaled());
    }

    #[test]
    fn fallback_scaling_captures_baseline_once() {
        let mut engine = ToggleEngine::new(
            WidgetConfig::default(),
            MemoryStore::default(),
            HeadlessSurface::without_zoom(),
            RecordingSynth::default(),
        );
        engine.increase_font();
        engine.increase_font();
        engine.increase_font();
        let px = engine.surface().root_font_size().unwrap();
        assert!((px - 16.0 * 1.1_f64.powi(3)).abs() < 1e-9);
        assert_eq!(engine.surface().root_font_reads(), 1);
        assert_eq!(engine.baseline().get(), Some(16.0));

        engine.reset_font();
        assert_eq!(engine.surface().root_font_size(), None);
        engine.decrease_font();
        let px = engine.surface().root_font_size().unwrap();
        assert!((px - 16.0 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn screen_reader_uses_one_listener_and_announces() {
        let (mut engine, _) = engine();
        engine.toggle_screen_reader();
        engine.toggle_screen_reader();
        engine.toggle_screen_reader();
        assert_eq!(engine.surface().listeners(), 1);
        assert!(engine.surface().indicator_active("screenReaderBtn"));
        assert!(engine.surface().control_visible("readPageBtn"));
        assert_eq!(
            engine.narrator().synth().last_text(),
            Some(ACTIVATED_ANNOUNCEMENT)
        );

        engine.toggle_screen_reader();
        assert_eq!(engine.surface().listeners(), 0);
        assert!(!engine.surface().control_visible("readPageBtn"));
        assert_eq!(
            engine.narrator().synth().last_text(),
            Some(DEACTIVATED_ANNOUNCEMENT)
        );
    }

    #[test]
    fn deactivation_cancels_in_flight_speech() {
        let (mut engine, _) = engine();
        engine.toggle_screen_reader();
        let cancels = engine.narrator().synth().cancels();
        engine.toggle_screen_reader();
        assert!(engine.narrator().synth().cancels() > cancels);
    }

    #[test]
    fn clicks_are_read_only_while_active_and_not_excluded() {
        let (mut engine, _) = engine();
        let target = ClickTarget::new(ElementKind::Paragraph, " Opening hours ");
        assert_eq!(engine.handle_click(&target), ClickDisposition::Inactive);

        engine.toggle_screen_reader();
        let before = engine.narrator().synth().spoken().len();
        let excluded = target.clone().with_marker("no-screen-reader");
        assert_eq!(engine.handle_click(&excluded), ClickDisposition::Excluded);
        assert_eq!(engine.narrator().synth().spoken().len(), before);

        assert_eq!(
            engine.handle_click(&target),
            ClickDisposition::Read("Opening hours".to_string())
        );
        assert_eq!(engine.narrator().synth().spoken().len(), before + 1);
        assert_eq!(engine.narrator().synth().last_text(), Some("Opening hours"));
    }

    #[test]
    fn speech_parameters_are_read_per_utterance() {
        let (mut engine, _) = engine();
        engine.speak("first");
        engine.update_speech(1.6, 0.2);
        engine.speak("second");
        let spoken = engine.narrator().synth().spoken();
        assert_eq!(spoken[0].rate, 0.9);
        assert_eq!(spoken[1].rate, 1.6);
        assert_eq!(spoken[1].volume, 0.2);
    }

    #[test]
    fn update_speech_clamps_and_persists() {
        let (mut engine, store) = engine();
        let prefs = engine.update_speech(9.0, 0.5);
        assert_eq!(prefs.rate, 2.0);
        assert!(store.raw(SPEECH_KEY).unwrap().contains("\"rate\":2.0"));
    }

    #[test]
    fn update_speech_without_values_keeps_stored_settings() {
        let (mut engine, store) = engine();
        engine.update_speech(1.5, 0.3);
        let prefs = engine.update_speech(f64::NAN, f64::NAN);
        assert_eq!(
            prefs,
            SpeechPreferences {
                rate: 1.5,
                volume: 0.3
            }
        );
        let saved: SpeechPreferences =
            serde_json::from_str(&store.raw(SPEECH_KEY).unwrap()).unwrap();
        assert_eq!(saved, prefs);

        let prefs = engine.update_speech(f64::INFINITY, 0.6);
        assert_eq!(prefs.rate, 1.5);
        assert_eq!(prefs.volume, 0.6);
    }

    #[test]
    fn restore_replays_persisted_features() {
        let store = MemoryStore::default();
        let prefs = AccessibilityPreferences {
            font_decrease_level: 2,
            highlight_links: true,
            hide_images: true,
            screen_reader: true,
            ..AccessibilityPreferences::default()
        };
        store.insert_raw(ACCESSIBILITY_KEY, &serde_json::to_string(&prefs).unwrap());

        let mut engine = engine_with(WidgetConfig::default(), store);
        let report = engine.restore();
        assert!(!report.recovered);
        assert_eq!(engine.snapshot(), prefs);
        assert!(engine.surface().indicator_active("hideImagesBtn"));
        assert_eq!(engine.surface().indicator_text("fontDecreaseLevel"), Some("2"));
        assert_eq!(engine.surface().listeners(), 1);
        assert!(engine.narrator().synth().spoken().is_empty());
    }

    #[test]
    fn restore_clamps_out_of_range_levels() {
        let store = MemoryStore::default();
        store.insert_raw(ACCESSIBILITY_KEY, r#"{"fontIncreaseLevel":9}"#);
        let mut engine = engine_with(WidgetConfig::default(), store);
        engine.restore();
        assert_eq!(engine.state().font.increase_level(), 3);
    }

    #[test]
    fn corrupted_store_is_wiped_on_restore() {
        let store = MemoryStore::default();
        store.insert_raw(ACCESSIBILITY_KEY, "{not json");
        store.insert_raw(SPEECH_KEY, r#"{"rate":1.4,"volume":0.5}"#);
        let mut engine = engine_with(WidgetConfig::default(), store.clone());
        let report = engine.restore();
        assert!(report.recovered);
        assert!(report.preferences.is_default());
        assert!(store.is_empty());
        assert!(engine.snapshot().is_default());
    }

    #[test]
    fn reset_all_clears_everything_but_speech() {
        let (mut engine, store) = engine();
        engine.update_speech(1.2, 0.6);
        engine.toggle(Feature::HighContrast);
        engine.toggle(Feature::InvertColors);
        engine.increase_font();
        engine.toggle_screen_reader();

        engine.reset_all();
        assert!(engine.snapshot().is_default());
        assert_eq!(engine.surface().zoom(), None);
        assert_eq!(engine.surface().listeners(), 0);
        assert!(!engine.surface().indicator_active("contrastBtn"));
        assert!(store.raw(ACCESSIBILITY_KEY).is_none());
        assert!(store.raw(SPEECH_KEY).is_some());
    }

    #[test]
    fn missing_indicators_are_ignored() {
        let mut engine = ToggleEngine::new(
            WidgetConfig::default(),
            MemoryStore::default(),
            HeadlessSurface::default().with_known_ids(["contrastBtn"]),
            RecordingSynth::default(),
        );
        engine.toggle(Feature::HideImages);
        engine.increase_font();
        assert!(engine.is_enabled(Feature::HideImages));
        assert!(!engine.surface().indicator_active("hideImagesBtn"));
        assert_eq!(engine.surface().indicator_text("fontIncreaseLevel"), None);
    }

    #[test]
    fn feature_states_cover_every_feature() {
        let (mut engine, _) = engine();
        engine.decrease_font();
        let states = engine.feature_states();
        assert_eq!(states.len(), 10);
        let decrease = states.iter().find(|s| s.id == "font-decrease").unwrap();
        assert_eq!(decrease.level, 1);
        assert!(decrease.active);
    }

    #[test]
    fn failed_saves_do_not_break_toggling() {
        let (mut engine, store) = engine();
        store.fail_writes(true);
        engine.toggle(Feature::LineHeight);
        assert!(engine.is_enabled(Feature::LineHeight));
        assert!(store.raw(ACCESSIBILITY_KEY).is_none());
    }
}
