//! Font scale level state machine.
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

/// How a scale factor reaches the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMechanism {
    /// Page-wide zoom; preferred whenever the host supports it.
    Zoom,
    /// Multiply the root element's baseline font size.
    RootFontSize,
}

/// Increase and decrease levels; at most one of them is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontScale {
    increase_level: u8,
    decrease_level: u8,
    max_level: u8,
}

impl Default for FontScale {
    fn default() -> Self {
        Self::new(3)
    }
}

impl FontScale {
    #[must_use]
    pub const fn new(max_level: u8) -> Self {
        Self {
            increase_level: 0,
            decrease_level: 0,
            max_level,
        }
    }

    /// Step one level larger. Returns false when already at the maximum.
    pub const fn increase(&mut self) -> bool {
        if self.increase_level >= self.max_level {
            return false;
        }
        self.decrease_level = 0;
        self.increase_level += 1;
        true
    }

    /// Step one level smaller. Returns false when already at the maximum.
    pub const fn decrease(&mut self) -> bool {
        if self.decrease_level >= self.max_level {
            return false;
        }
        self.increase_level = 0;
        self.decrease_level += 1;
        true
    }

    pub const fn reset(&mut self) {
        self.increase_level = 0;
        self.decrease_level = 0;
    }

    #[must_use]
    pub const fn increase_level(&self) -> u8 {
        self.increase_level
    }

    #[must_use]
    pub const fn decrease_level(&self) -> u8 {
        self.decrease_level
    }

    #[must_use]
    pub const fn max_level(&self) -> u8 {
        self.max_level
    }

    #[must_use]
    pub const fn is_scaled(&self) -> bool {
        self.increase_level > 0 || self.decrease_level > 0
    }

    /// Multiplicative factor for the current level; exactly 1.0 when unscaled.
    #[must_use]
    pub fn factor(&self, step: f64) -> f64 {
        if self.increase_level > 0 {
            step.powi(i32::from(self.increase_level))
        } else if self.decrease_level > 0 {
            step.recip().powi(i32::from(self.decrease_level))
        } else {
            1.0
        }
    }

    /// Badge text for a level: the number, or empty at zero.
    #[must_use]
    pub fn badge(level: u8) -> String {
        if level == 0 {
            String::new()
        } else {
            level.to_string()
        }
    }
}

/// Root font size captured the first time the fallback path runs.
///
/// Once set it is never recomputed; re-reading the computed size after
/// scaling would compound the factor.
#[derive(Debug, Default)]
pub struct FontBaseline {
    captured: OnceCell<f64>,
}

impl FontBaseline {
    /// Return the captured baseline, capturing it with `measure` if this is
    /// the first call. A failed measurement leaves the baseline uncaptured.
    pub fn get_or_capture(&self, measure: impl FnOnce() -> Option<f64>) -> Option<f64> {
        if let Some(px) = self.captured.get() {
            return Some(*px);
        }
        let px = measure().filter(|px| px.is_finite() && *px > 0.0)?;
        let _ = self.captured.set(px);
        Some(px)
    }

    #[must_use]
    pub fn get(&self) -> Option<f64> {
        self.captured.get().copied()
    }
}
