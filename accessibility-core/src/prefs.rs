//! Persisted preference records.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::feature::Feature;

pub const ACCESSIBILITY_KEY: &str = "accessibilitySettings";
pub const SPEECH_KEY: &str = "speechSettings";

pub const MIN_RATE: f64 = 0.5;
pub const MAX_RATE: f64 = 2.0;
pub const MIN_VOLUME: f64 = 0.0;
pub const MAX_VOLUME: f64 = 1.0;

/// A record persisted wholesale under a fixed storage key.
pub trait Record: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;
}

/// Display preferences, overwritten in full on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityPreferences {
    pub font_increase_level: u8,
    pub font_decrease_level: u8,
    pub high_contrast: bool,
    pub invert_colors: bool,
    pub saturate_colors: bool,
    pub highlight_links: bool,
    pub text_spacing: bool,
    pub line_height: bool,
    pub hide_images: bool,
    pub screen_reader: bool,
}

impl Record for AccessibilityPreferences {
    const KEY: &'static str = ACCESSIBILITY_KEY;
}

impl AccessibilityPreferences {
    #[must_use]
    pub const fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::HighContrast => self.high_contrast,
            Feature::InvertColors => self.invert_colors,
            Feature::SaturateColors => self.saturate_colors,
            Feature::HighlightLinks => self.highlight_links,
            Feature::TextSpacing => self.text_spacing,
            Feature::LineHeight => self.line_height,
            Feature::HideImages => self.hide_images,
        }
    }

    pub const fn set_enabled(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::HighContrast => &mut self.high_contrast,
            Feature::InvertColors => &mut self.invert_colors,
            Feature::SaturateColors => &mut self.saturate_colors,
            Feature::HighlightLinks => &mut self.highlight_links,
            Feature::TextSpacing => &mut self.text_spacing,
            Feature::LineHeight => &mut self.line_height,
            Feature::HideImages => &mut self.hide_images,
        };
        *slot = enabled;
    }

    /// Boolean features switched on, in replay order.
    #[must_use]
    pub fn enabled_features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }

    /// True when nothing deviates from the defaults.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Named default sets for speech parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechPreset {
    /// Unadjusted synthesis: rate 1.0, volume 1.0.
    Classic,
    /// Slightly slower and quieter: rate 0.9, volume 0.8.
    #[default]
    Tuned,
}

impl SpeechPreset {
    #[must_use]
    pub const fn defaults(self) -> SpeechPreferences {
        match self {
            Self::Classic => SpeechPreferences {
                rate: 1.0,
                volume: 1.0,
            },
            Self::Tuned => SpeechPreferences {
                rate: 0.9,
                volume: 0.8,
            },
        }
    }
}

/// Speech parameters read at the moment each utterance starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechPreferences {
    pub rate: f64,
    pub volume: f64,
}

impl Default for SpeechPreferences {
    fn default() -> Self {
        SpeechPreset::default().defaults()
    }
}

impl Record for SpeechPreferences {
    const KEY: &'static str = SPEECH_KEY;
}

impl SpeechPreferences {
    /// Clamp both parameters into their slider ranges. Non-finite values fall
    /// back to the supplied defaults.
    #[must_use]
    pub fn clamped(self, fallback: Self) -> Self {
        let rate = if self.rate.is_finite() {
            self.rate.clamp(MIN_RATE, MAX_RATE)
        } else {
            fallback.rate
        };
        let volume = if self.volume.is_finite() {
            self.volume.clamp(MIN_VOLUME, MAX_VOLUME)
        } else {
            fallback.volume
        };
        Self { rate, volume }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_original_camel_case_keys() {
        let prefs = AccessibilityPreferences {
            font_increase_level: 2,
            high_contrast: true,
            ..AccessibilityPreferences::default()
        };
        let json = serde_json::to_value(prefs).unwrap();
        assert_eq!(json["fontIncreaseLevel"], 2);
        assert_eq!(json["highContrast"], true);
        assert_eq!(json["screenReader"], false);
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn partial_records_fill_missing_fields_with_defaults() {
        let prefs: AccessibilityPreferences =
            serde_json::from_str(r#"{"invertColors":true}"#).unwrap();
        assert!(prefs.invert_colors);
        assert_eq!(prefs.font_increase_level, 0);
        assert!(!prefs.high_contrast);
    }

    #[test]
    fn set_enabled_touches_only_the_named_feature() {
        let mut prefs = AccessibilityPreferences::default();
        prefs.set_enabled(Feature::LineHeight, true);
        assert_eq!(prefs.enabled_features(), vec![Feature::LineHeight]);
        prefs.set_enabled(Feature::LineHeight, false);
        assert!(prefs.is_default());
    }

    #[test]
    fn presets_match_revision_defaults() {
        assert_eq!(
            SpeechPreset::Classic.defaults(),
            SpeechPreferences {
                rate: 1.0,
                volume: 1.0
            }
        );
        assert_eq!(SpeechPreferences::default().rate, 0.9);
        assert_eq!(SpeechPreferences::default().volume, 0.8);
    }

    #[test]
    fn clamped_keeps_parameters_inside_slider_ranges() {
        let fallback = SpeechPreferences::default();
        let wild = SpeechPreferences {
            rate: 7.0,
            volume: -1.0,
        };
        assert_eq!(
            wild.clamped(fallback),
            SpeechPreferences {
                rate: MAX_RATE,
                volume: MIN_VOLUME
            }
        );
        let nan = SpeechPreferences {
            rate: f64::NAN,
            volume: 0.5,
        };
        assert_eq!(nan.clamped(fallback).rate, fallback.rate);
    }
}
