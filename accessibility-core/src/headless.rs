//! In-memory implementations of the platform traits.
//!
//! Used by unit tests, the QA tester and any host that wants to drive the
//! engine without a browser.
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::config::FilterScope;
use crate::font_scale::ScaleMechanism;
use crate::speech::{SpeechSynth, Utterance};
use crate::store::KeyValueStore;
use crate::surface::PageSurface;

#[derive(Debug, thiserror::Error)]
#[error("memory store rejected the write")]
pub struct MemoryStoreError;

/// Shared string map; clones see the same data, like two page loads over one
/// origin's storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(MemoryStoreError);
        }
        self.insert_raw(key, value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// A page modelled as sets of markers and indicator states.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    body_markers: BTreeSet<String>,
    /// Filters applied to page siblings rather than the body.
    sibling_filters: BTreeSet<String>,
    active_indicators: BTreeSet<String>,
    indicator_text: BTreeMap<String, String>,
    visible_controls: BTreeSet<String>,
    /// Ids that exist on the page; `None` means every id exists.
    known_ids: Option<BTreeSet<String>>,
    mechanism: ScaleMechanism,
    zoom: Option<f64>,
    base_font_px: f64,
    root_font_px: Option<f64>,
    root_font_reads: Cell<usize>,
    listeners: usize,
    listener_attaches: usize,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            body_markers: BTreeSet::new(),
            sibling_filters: BTreeSet::new(),
            active_indicators: BTreeSet::new(),
            indicator_text: BTreeMap::new(),
            visible_controls: BTreeSet::new(),
            known_ids: None,
            mechanism: ScaleMechanism::Zoom,
            zoom: None,
            base_font_px: 16.0,
            root_font_px: None,
            root_font_reads: Cell::new(0),
            listeners: 0,
            listener_attaches: 0,
        }
    }
}

impl HeadlessSurface {
    /// A surface without zoom support, forcing the root font size path.
    #[must_use]
    pub fn without_zoom() -> Self {
        Self {
            mechanism: ScaleMechanism::RootFontSize,
            ..Self::default()
        }
    }

    /// Restrict which indicator/control ids exist; others are ignored.
    #[must_use]
    pub fn with_known_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    fn exists(&self, id: &str) -> bool {
        self.known_ids.as_ref().is_none_or(|ids| ids.contains(id))
    }

    #[must_use]
    pub fn indicator_active(&self, id: &str) -> bool {
        self.active_indicators.contains(id)
    }

    #[must_use]
    pub fn indicator_text(&self, id: &str) -> Option<&str> {
        self.indicator_text.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn control_visible(&self, id: &str) -> bool {
        self.visible_controls.contains(id)
    }

    #[must_use]
    pub fn body_markers(&self) -> Vec<&str> {
        self.body_markers.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn sibling_filter(&self, marker: &str) -> bool {
        self.sibling_filters.contains(marker)
    }

    #[must_use]
    pub const fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    #[must_use]
    pub const fn root_font_size(&self) -> Option<f64> {
        self.root_font_px
    }

    /// How often the computed root size was measured.
    #[must_use]
    pub fn root_font_reads(&self) -> usize {
        self.root_font_reads.get()
    }

    #[must_use]
    pub const fn listeners(&self) -> usize {
        self.listeners
    }

    #[must_use]
    pub const fn listener_attaches(&self) -> usize {
        self.listener_attaches
    }
}

impl PageSurface for HeadlessSurface {
    fn set_marker(&mut self, marker: &str, enabled: bool) {
        if enabled {
            self.body_markers.insert(marker.to_string());
        } else {
            self.body_markers.remove(marker);
        }
    }

    fn has_marker(&self, marker: &str) -> bool {
        self.body_markers.contains(marker) || self.sibling_filters.contains(marker)
    }

    fn set_page_filter(&mut self, marker: &str, enabled: bool, scope: FilterScope) {
        match scope {
            FilterScope::Body => self.set_marker(marker, enabled),
            FilterScope::PageSiblings => {
                if enabled {
                    self.sibling_filters.insert(marker.to_string());
                } else {
                    self.sibling_filters.remove(marker);
                }
            }
        }
    }

    fn set_indicator_active(&mut self, id: &str, active: bool) {
        if !self.exists(id) {
            return;
        }
        if active {
            self.active_indicators.insert(id.to_string());
        } else {
            self.active_indicators.remove(id);
        }
    }

    fn set_indicator_text(&mut self, id: &str, text: &str) {
        if self.exists(id) {
            self.indicator_text.insert(id.to_string(), text.to_string());
        }
    }

    fn set_control_visible(&mut self, id: &str, visible: bool) {
        if !self.exists(id) {
            return;
        }
        if visible {
            self.visible_controls.insert(id.to_string());
        } else {
            self.visible_controls.remove(id);
        }
    }

    fn detect_scale_mechanism(&self) -> ScaleMechanism {
        self.mechanism
    }

    fn apply_zoom(&mut self, factor: Option<f64>) {
        self.zoom = factor;
    }

    fn computed_root_font_size(&self) -> Option<f64> {
        self.root_font_reads.set(self.root_font_reads.get() + 1);
        Some(self.root_font_px.unwrap_or(self.base_font_px))
    }

    fn set_root_font_size(&mut self, px: Option<f64>) {
        self.root_font_px = px;
    }

    fn attach_reader_listener(&mut self) {
        if self.listeners == 0 {
            self.listeners = 1;
            self.listener_attaches += 1;
        }
    }

    fn detach_reader_listener(&mut self) {
        self.listeners = 0;
    }
}

/// Synth that records every utterance and tracks overlap.
#[derive(Debug, Clone)]
pub struct RecordingSynth {
    supported: bool,
    active: Option<Utterance>,
    spoken: Vec<Utterance>,
    cancels: usize,
    max_concurrent: usize,
}

impl Default for RecordingSynth {
    fn default() -> Self {
        Self {
            supported: true,
            active: None,
            spoken: Vec::new(),
            cancels: 0,
            max_concurrent: 0,
        }
    }
}

impl RecordingSynth {
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn active(&self) -> Option<&Utterance> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn spoken(&self) -> &[Utterance] {
        &self.spoken
    }

    #[must_use]
    pub fn last_text(&self) -> Option<&str> {
        self.spoken.last().map(|u| u.text.as_str())
    }

    #[must_use]
    pub const fn cancels(&self) -> usize {
        self.cancels
    }

    /// Highest number of utterances that were ever playing at once.
    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Simulate the end event of the current utterance.
    pub fn finish(&mut self) {
        self.active = None;
    }

    pub fn clear_log(&mut self) {
        self.spoken.clear();
    }
}

impl SpeechSynth for RecordingSynth {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn speak(&mut self, utterance: &Utterance) {
        let concurrent = usize::from(self.active.is_some()) + 1;
        self.max_concurrent = self.max_concurrent.max(concurrent);
        self.active = Some(utterance.clone());
        self.spoken.push(utterance.clone());
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.active = None;
    }
}
