//! Accessibility Core
//!
//! Platform-agnostic state model for the accessibility controls widget.
//! This crate owns the preference records, the toggle engine, the font scale
//! state machine and the screen reader rules; hosts supply storage, a page
//! surface and a speech backend through the traits re-exported here.

pub mod config;
pub mod dropdown;
pub mod engine;
pub mod error;
pub mod feature;
pub mod font_scale;
pub mod headless;
pub mod keyboard;
pub mod prefs;
pub mod screen_reader;
pub mod speech;
pub mod store;
pub mod surface;

// Re-export commonly used types
pub use config::{ContrastPolicy, FilterScope, MenuLayout, WidgetConfig};
pub use dropdown::Dropdown;
pub use engine::{EngineState, RestoreReport, ToggleEngine};
pub use error::{ConfigError, StoreError};
pub use feature::{Feature, FeatureKind, FeatureState, ids};
pub use font_scale::{FontBaseline, FontScale, ScaleMechanism};
pub use keyboard::{Action, KeyInput, LinkCursor, key_from_code, resolve};
pub use prefs::{
    ACCESSIBILITY_KEY, AccessibilityPreferences, Record, SPEECH_KEY, SpeechPreferences,
    SpeechPreset,
};
pub use screen_reader::{
    ClickDisposition, ClickTarget, ElementKind, ExclusionRules, PageFragment,
    compose_page_reading, readable_text,
};
pub use speech::{Narrator, SpeakOutcome, SpeechSynth, Utterance};
pub use store::{KeyValueStore, PreferenceStore};
pub use surface::PageSurface;
