//! Integrator-facing widget configuration.
//!
//! Every field has a default so an embedding page only needs to name the
//! values it wants to change:
//!
//! ```json
//! { "contrastPolicy": "exclusive-high-contrast", "exclusionMarkers": ["advert"] }
//! ```
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feature::ids;
use crate::prefs::SpeechPreset;

/// How high-contrast interacts with the invert and saturate filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastPolicy {
    /// All three features toggle on their own.
    #[default]
    Independent,
    /// Enabling high-contrast clears invert and saturate; disabling it
    /// restores normal contrast by clearing all three.
    ExclusiveHighContrast,
}

/// Where invert/saturate filters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterScope {
    /// A single marker on the document body.
    Body,
    /// Every top-level child of the body except the widget and the toast
    /// overlay; nested images receive a counter marker.
    #[default]
    PageSiblings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLayout {
    SingleColumn,
    TwoColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    /// Keep the screen reader from reading the widget's own controls.
    pub skip_widget_menu: bool,
    /// Class names or ids whose elements (and descendants) are never read.
    pub exclusion_markers: Vec<String>,
    pub max_font_level: u8,
    pub font_scale_step: f64,
    pub two_column_layout: bool,
    /// Viewport width (px) from which the two-column layout is used.
    pub two_column_min_width: u32,
    pub contrast_policy: ContrastPolicy,
    pub filter_scope: FilterScope,
    pub speech_preset: SpeechPreset,
    /// Page fragments must be longer than this to be read aloud.
    pub read_page_min_length: usize,
    pub resize_debounce_ms: u32,
    /// Window after opening the menu during which outside clicks are ignored.
    pub dropdown_guard_ms: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            skip_widget_menu: true,
            exclusion_markers: vec![
                ids::MENU_MARKER.to_string(),
                "no-screen-reader".to_string(),
                "skip-reading".to_string(),
            ],
            max_font_level: 3,
            font_scale_step: 1.1,
            two_column_layout: false,
            two_column_min_width: 768,
            contrast_policy: ContrastPolicy::default(),
            filter_scope: FilterScope::default(),
            speech_preset: SpeechPreset::default(),
            read_page_min_length: 3,
            resize_debounce_ms: 150,
            dropdown_guard_ms: 200,
        }
    }
}

impl WidgetConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_font_level == 0 {
            return Err(ConfigError::ZeroMaxLevel);
        }
        if !self.font_scale_step.is_finite() || self.font_scale_step <= 1.0 {
            return Err(ConfigError::InvalidStep(self.font_scale_step));
        }
        if self.read_page_min_length >= 64 {
            return Err(ConfigError::InvalidMinLength(self.read_page_min_length));
        }
        Ok(())
    }

    /// Layout for the given viewport width.
    #[must_use]
    pub const fn layout_for_width(&self, viewport_width: u32) -> MenuLayout {
        if self.two_column_layout && viewport_width >= self.two_column_min_width {
            MenuLayout::TwoColumn
        } else {
            MenuLayout::SingleColumn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = WidgetConfig::from_json("{}").unwrap();
        assert_eq!(config, WidgetConfig::default());
        assert_eq!(config.contrast_policy, ContrastPolicy::Independent);
        assert!(config.exclusion_markers.iter().any(|m| m == "skip-reading"));
    }

    #[test]
    fn named_fields_override_defaults() {
        let config = WidgetConfig::from_json(
            r#"{"contrastPolicy":"exclusive-high-contrast","maxFontLevel":5,"speechPreset":"classic"}"#,
        )
        .unwrap();
        assert_eq!(config.contrast_policy, ContrastPolicy::ExclusiveHighContrast);
        assert_eq!(config.max_font_level, 5);
        assert_eq!(config.speech_preset, SpeechPreset::Classic);
        assert!(config.skip_widget_menu);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            WidgetConfig::from_json(r#"{"maxFontLevel":0}"#),
            Err(ConfigError::ZeroMaxLevel)
        ));
        assert!(matches!(
            WidgetConfig::from_json(r#"{"fontScaleStep":0.9}"#),
            Err(ConfigError::InvalidStep(_))
        ));
        assert!(matches!(
            WidgetConfig::from_json("{oops"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn two_column_layout_is_gated_by_flag_and_width() {
        let mut config = WidgetConfig::default();
        assert_eq!(config.layout_for_width(1200), MenuLayout::SingleColumn);
        config.two_column_layout = true;
        assert_eq!(config.layout_for_width(1200), MenuLayout::TwoColumn);
        assert_eq!(config.layout_for_width(480), MenuLayout::SingleColumn);
    }
}
