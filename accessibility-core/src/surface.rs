//! The presentation surface the engine mutates.
//!
//! Implementations must silently ignore targets that do not exist: a host
//! page missing an indicator element still gets the feature itself.
use crate::config::FilterScope;
use crate::font_scale::ScaleMechanism;

pub trait PageSurface {
    /// Add or remove a presentation marker on the document body.
    fn set_marker(&mut self, marker: &str, enabled: bool);

    fn has_marker(&self, marker: &str) -> bool;

    /// Apply a color filter marker according to `scope`. `has_marker` must
    /// report the filter as enabled afterwards regardless of scope.
    fn set_page_filter(&mut self, marker: &str, enabled: bool, scope: FilterScope);

    fn set_indicator_active(&mut self, id: &str, active: bool);

    fn set_indicator_text(&mut self, id: &str, text: &str);

    fn set_control_visible(&mut self, id: &str, visible: bool);

    /// Which scaling path the host supports. Called once per engine.
    fn detect_scale_mechanism(&self) -> ScaleMechanism;

    /// `None` clears any zoom.
    fn apply_zoom(&mut self, factor: Option<f64>);

    /// Current computed root font size in pixels.
    fn computed_root_font_size(&self) -> Option<f64>;

    /// `None` clears the inline size.
    fn set_root_font_size(&mut self, px: Option<f64>);

    /// Register the single delegated click listener. Must be idempotent.
    fn attach_reader_listener(&mut self);

    fn detach_reader_listener(&mut self);
}
