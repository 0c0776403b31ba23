//! Menu visibility state.
use crate::config::MenuLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dropdown {
    open: bool,
    guard_armed: bool,
    speech_panel_open: bool,
    layout: MenuLayout,
}

impl Default for Dropdown {
    fn default() -> Self {
        Self {
            open: false,
            guard_armed: false,
            speech_panel_open: false,
            layout: MenuLayout::SingleColumn,
        }
    }
}

impl Dropdown {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn speech_panel_open(&self) -> bool {
        self.speech_panel_open
    }

    #[must_use]
    pub const fn layout(&self) -> MenuLayout {
        self.layout
    }

    #[must_use]
    pub const fn guard_armed(&self) -> bool {
        self.guard_armed
    }

    pub const fn open(&mut self) {
        self.open = true;
        self.speech_panel_open = false;
    }

    pub const fn close(&mut self) {
        self.open = false;
        self.speech_panel_open = false;
    }

    pub const fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Click on the menu button. Arms the guard so the same click, bubbling
    /// on as an outside click, cannot immediately close the menu again. The
    /// host releases the guard after `dropdownGuardMs`.
    pub const fn on_toggle_click(&mut self) {
        self.guard_armed = true;
        self.toggle();
    }

    pub const fn release_guard(&mut self) {
        self.guard_armed = false;
    }

    /// Click outside the widget. Returns true if it closed the menu.
    pub const fn on_outside_click(&mut self) -> bool {
        if self.guard_armed || !self.open {
            return false;
        }
        self.close();
        true
    }

    /// Returns true if the key closed the menu.
    pub fn on_key(&mut self, key: &str) -> bool {
        if key == "Escape" && self.open {
            self.close();
            return true;
        }
        false
    }

    pub const fn toggle_speech_panel(&mut self) -> bool {
        self.speech_panel_open = !self.speech_panel_open;
        self.speech_panel_open
    }

    /// Returns true when the layout changed.
    pub fn set_layout(&mut self, layout: MenuLayout) -> bool {
        let changed = self.layout != layout;
        self.layout = layout;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_ignores_outside_click_right_after_opening() {
        let mut menu = Dropdown::default();
        menu.on_toggle_click();
        assert!(menu.is_open());
        assert!(!menu.on_outside_click());
        menu.release_guard();
        assert!(menu.on_outside_click());
        assert!(!menu.is_open());
    }

    #[test]
    fn escape_closes_only_an_open_menu() {
        let mut menu = Dropdown::default();
        assert!(!menu.on_key("Escape"));
        menu.open();
        assert!(!menu.on_key("Enter"));
        assert!(menu.on_key("Escape"));
        assert!(!menu.is_open());
    }

    #[test]
    fn opening_or_closing_collapses_speech_panel() {
        let mut menu = Dropdown::default();
        menu.open();
        assert!(menu.toggle_speech_panel());
        menu.close();
        assert!(!menu.speech_panel_open());
        menu.open();
        menu.toggle_speech_panel();
        menu.toggle();
        menu.toggle();
        assert!(!menu.speech_panel_open());
    }

    #[test]
    fn layout_change_is_reported_once() {
        let mut menu = Dropdown::default();
        assert!(menu.set_layout(MenuLayout::TwoColumn));
        assert!(!menu.set_layout(MenuLayout::TwoColumn));
    }
}
