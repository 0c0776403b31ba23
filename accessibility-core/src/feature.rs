//! Feature catalogue and the DOM contract each feature is bound to.
use serde::{Deserialize, Serialize};

/// Element identifiers and marker classes the widget markup must provide.
pub mod ids {
    pub const WIDGET_MARKER: &str = "accessibility-widget";
    pub const MENU_MARKER: &str = "accessibility-dropdown";
    pub const TOAST_MARKER: &str = "accessibility-toast";
    pub const MENU_TOGGLE: &str = "accessibilityMenu";
    pub const MENU_DROPDOWN: &str = "accessibilityDropdown";
    pub const CONFIG_SCRIPT: &str = "accessibility-config";

    pub const FONT_INCREASE_BTN: &str = "fontIncreaseBtn";
    pub const FONT_DECREASE_BTN: &str = "fontDecreaseBtn";
    pub const FONT_NORMAL_BTN: &str = "fontNormalBtn";
    pub const FONT_INCREASE_LEVEL: &str = "fontIncreaseLevel";
    pub const FONT_DECREASE_LEVEL: &str = "fontDecreaseLevel";

    pub const SCREEN_READER_BTN: &str = "screenReaderBtn";
    pub const READ_PAGE_BTN: &str = "readPageBtn";
    pub const SPEECH_SETTINGS_BTN: &str = "speechSettingsBtn";
    pub const SPEECH_CONTROLS: &str = "speechControls";
    pub const SPEECH_RATE: &str = "speechRate";
    pub const SPEECH_VOLUME: &str = "speechVolume";
    pub const RATE_VALUE: &str = "rateValue";
    pub const VOLUME_VALUE: &str = "volumeValue";
    pub const TEST_SPEECH_BTN: &str = "testSpeechBtn";
    pub const RESET_BTN: &str = "resetAllBtn";

    pub const ACTIVE_CLASS: &str = "active";
    pub const SHOW_CLASS: &str = "show";
    pub const TWO_COLUMN_CLASS: &str = "two-column";
    /// Applied to images under an inverted or saturated container so the
    /// filter is cancelled out instead of compounding.
    pub const FILTER_COUNTER_CLASS: &str = "accessibility-filter-counter";
}

/// One of the seven independent on/off presentation features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    HighContrast,
    InvertColors,
    SaturateColors,
    HighlightLinks,
    TextSpacing,
    LineHeight,
    HideImages,
}

impl Feature {
    /// Replay order used when restoring persisted preferences.
    pub const ALL: [Self; 7] = [
        Self::HighContrast,
        Self::InvertColors,
        Self::SaturateColors,
        Self::HighlightLinks,
        Self::TextSpacing,
        Self::LineHeight,
        Self::HideImages,
    ];

    /// Presentation marker (class) toggled on the page.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::HighContrast => "high-contrast",
            Self::InvertColors => "invert-colors",
            Self::SaturateColors => "saturate-colors",
            Self::HighlightLinks => "highlight-links",
            Self::TextSpacing => "text-spacing",
            Self::LineHeight => "line-height",
            Self::HideImages => "hide-images",
        }
    }

    /// Identifier of the button whose `active` marker mirrors this feature.
    #[must_use]
    pub const fn indicator_id(self) -> &'static str {
        match self {
            Self::HighContrast => "contrastBtn",
            Self::InvertColors => "invertBtn",
            Self::SaturateColors => "saturationBtn",
            Self::HighlightLinks => "highlightLinksBtn",
            Self::TextSpacing => "textSpacingBtn",
            Self::LineHeight => "lineHeightBtn",
            Self::HideImages => "hideImagesBtn",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighContrast => "High Contrast",
            Self::InvertColors => "Invert Colors",
            Self::SaturateColors => "Saturation",
            Self::HighlightLinks => "Highlight Links",
            Self::TextSpacing => "Text Spacing",
            Self::LineHeight => "Line Height",
            Self::HideImages => "Hide Images",
        }
    }

    /// Color filters that distort images and are subject to the page-wide
    /// application rule.
    #[must_use]
    pub const fn is_color_filter(self) -> bool {
        matches!(self, Self::InvertColors | Self::SaturateColors)
    }

    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.marker() == marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Boolean,
    Level,
}

/// Read-only view of a single feature's live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureState {
    pub id: &'static str,
    pub kind: FeatureKind,
    pub active: bool,
    pub level: u8,
}

impl FeatureState {
    #[must_use]
    pub const fn boolean(id: &'static str, active: bool) -> Self {
        Self {
            id,
            kind: FeatureKind::Boolean,
            active,
            level: 0,
        }
    }

    #[must_use]
    pub const fn level(id: &'static str, level: u8) -> Self {
        Self {
            id,
            kind: FeatureKind::Level,
            active: level > 0,
            level,
        }
    }
}
