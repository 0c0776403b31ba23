//! Keyboard shortcut lookup and link navigation cursor.
use serde::Serialize;

use crate::feature::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Toggle(Feature),
    IncreaseFont,
    DecreaseFont,
    ResetFont,
    ToggleScreenReader,
    ReadPage,
    ToggleMenu,
    ResetAll,
    ScrollDown,
    ScrollUp,
    NextLink,
    PreviousLink,
}

/// A keydown reduced to what the dispatch table looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// Layout-independent key, see [`key_from_code`].
    pub key: char,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    /// Focus is inside a text field, text area or contenteditable.
    pub editing: bool,
}

/// Map a physical `KeyboardEvent.code` to the character the table uses.
/// Alt combinations change `key` on some layouts, `code` does not.
#[must_use]
pub fn key_from_code(code: &str) -> Option<char> {
    if let Some(letter) = code.strip_prefix("Key") {
        let mut chars = letter.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c.to_ascii_lowercase()),
            _ => None,
        };
    }
    if let Some(digit) = code.strip_prefix("Digit") {
        return digit.chars().next().filter(char::is_ascii_digit);
    }
    match code {
        "Equal" | "NumpadAdd" => Some('='),
        "Minus" | "NumpadSubtract" => Some('-'),
        _ => None,
    }
}

/// Look up the action bound to a key press.
#[must_use]
pub fn resolve(input: KeyInput) -> Option<Action> {
    if input.ctrl || input.meta {
        return None;
    }
    if input.alt {
        return alt_binding(input.key);
    }
    if input.editing {
        return None;
    }
    match input.key {
        'j' => Some(Action::ScrollDown),
        'k' => Some(Action::ScrollUp),
        'n' => Some(Action::NextLink),
        'b' => Some(Action::PreviousLink),
        _ => None,
    }
}

const fn alt_binding(key: char) -> Option<Action> {
    let action = match key {
        'a' => Action::ToggleMenu,
        'c' => Action::Toggle(Feature::HighContrast),
        'i' => Action::Toggle(Feature::InvertColors),
        's' => Action::Toggle(Feature::SaturateColors),
        'l' => Action::Toggle(Feature::HighlightLinks),
        't' => Action::Toggle(Feature::TextSpacing),
        'h' => Action::Toggle(Feature::LineHeight),
        'g' => Action::Toggle(Feature::HideImages),
        'r' => Action::ToggleScreenReader,
        'p' => Action::ReadPage,
        '=' => Action::IncreaseFont,
        '-' => Action::DecreaseFont,
        '0' => Action::ResetFont,
        'x' => Action::ResetAll,
        _ => return None,
    };
    Some(action)
}

/// Position within a precomputed list of navigation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkCursor {
    len: usize,
    position: Option<usize>,
}

impl LinkCursor {
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self {
            len,
            position: None,
        }
    }

    /// Advance, wrapping to the first link. `None` when there are no links.
    pub const fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let next = match self.position {
            Some(p) if p + 1 < self.len => p + 1,
            _ => 0,
        };
        self.position = Some(next);
        Some(next)
    }

    pub const fn previous(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let prev = match self.position {
            Some(p) if p > 0 => p - 1,
            _ => self.len - 1,
        };
        self.position = Some(prev);
        Some(prev)
    }

    /// Replace the link list length, keeping the position when still valid.
    pub const fn set_len(&mut self, len: usize) {
        self.len = len;
        if let Some(p) = self.position
            && p >= len
        {
            self.position = None;
        }
    }
}
