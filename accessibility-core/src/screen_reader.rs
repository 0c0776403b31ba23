//! Click-to-speak rules: what an element reads as, and which elements are
//! never read.
use serde::{Deserialize, Serialize};

use crate::config::WidgetConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Image,
    Link,
    Button,
    FormControl,
    Heading(u8),
    Paragraph,
    ListItem,
    Other,
}

impl ElementKind {
    /// Classify an element by (case-insensitive) tag name.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "img" => Self::Image,
            "a" => Self::Link,
            "button" => Self::Button,
            "input" | "textarea" | "select" => Self::FormControl,
            "p" => Self::Paragraph,
            "li" => Self::ListItem,
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            _ => Self::Other,
        }
    }
}

/// Everything the reader needs to know about a clicked element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickTarget {
    pub kind: Option<ElementKind>,
    pub text: String,
    pub alt: Option<String>,
    pub href: Option<String>,
    pub title: Option<String>,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    /// True when the element sits inside the widget container.
    pub inside_widget: bool,
    /// Class names and ids of the element and all of its ancestors.
    pub markers: Vec<String>,
}

impl ClickTarget {
    #[must_use]
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Derive the spoken text for a clicked element.
#[must_use]
pub fn readable_text(target: &ClickTarget) -> String {
    let text = target.text.trim();
    match target.kind.unwrap_or(ElementKind::Other) {
        ElementKind::Image => non_blank(target.alt.as_deref())
            .unwrap_or("Image")
            .to_string(),
        ElementKind::Link => {
            let bare = matches!(target.href.as_deref().map(str::trim), None | Some("" | "#"));
            if bare {
                text.to_string()
            } else {
                format!("{text} (Link)")
            }
        }
        ElementKind::Button => non_blank(Some(text))
            .or_else(|| non_blank(target.title.as_deref()))
            .unwrap_or("Button")
            .to_string(),
        ElementKind::FormControl => non_blank(target.value.as_deref())
            .or_else(|| non_blank(target.placeholder.as_deref()))
            .unwrap_or("Form field")
            .to_string(),
        _ => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    skip_widget: bool,
    markers: Vec<String>,
}

impl ExclusionRules {
    #[must_use]
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            skip_widget: config.skip_widget_menu,
            markers: config.exclusion_markers.clone(),
        }
    }

    #[must_use]
    pub fn excludes(&self, target: &ClickTarget) -> bool {
        if self.skip_widget && target.inside_widget {
            return true;
        }
        target
            .markers
            .iter()
            .any(|m| self.markers.iter().any(|excluded| excluded == m))
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// What happened to a click while the reader was consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDisposition {
    /// Reader is off; the click proceeds normally.
    Inactive,
    /// Target is excluded; the click proceeds normally.
    Excluded,
    /// Default action suppressed; nothing readable was found.
    Silent,
    /// Default action suppressed and the text was spoken.
    Read(String),
}

impl ClickDisposition {
    #[must_use]
    pub const fn suppresses_default(&self) -> bool {
        matches!(self, Self::Silent | Self::Read(_))
    }
}

/// One readable block collected for a whole-page reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFragment {
    pub kind: ElementKind,
    pub text: String,
}

impl PageFragment {
    #[must_use]
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Concatenate the page title and every fragment longer than `min_length`
/// characters, in document order, as a single utterance.
#[must_use]
pub fn compose_page_reading(title: &str, fragments: &[PageFragment], min_length: usize) -> String {
    let mut content = format!("Page title: {}. ", title.trim());
    for fragment in fragments {
        let text = fragment.text.trim();
        if text.chars().count() <= min_length {
            continue;
        }
        if let ElementKind::Heading(level) = fragment.kind {
            content.push_str(&format!("Heading level {level}: "));
        }
        content.push_str(text);
        content.push_str(". ");
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_classify_case_insensitively() {
        assert_eq!(ElementKind::from_tag("IMG"), ElementKind::Image);
        assert_eq!(ElementKind::from_tag("h3"), ElementKind::Heading(3));
        assert_eq!(ElementKind::from_tag("SELECT"), ElementKind::FormControl);
        assert_eq!(ElementKind::from_tag("span"), ElementKind::Other);
    }

    #[test]
    fn images_read_alt_or_placeholder_word() {
        let mut img = ClickTarget::new(ElementKind::Image, "");
        assert_eq!(readable_text(&img), "Image");
        img.alt = Some("A red kite".into());
        assert_eq!(readable_text(&img), "A red kite");
    }

    #[test]
    fn links_announce_themselves_unless_bare_fragment() {
        let mut link = ClickTarget::new(ElementKind::Link, "  Contact us ");
        link.href = Some("/contact".into());
        assert_eq!(readable_text(&link), "Contact us (Link)");
        link.href = Some("#".into());
        assert_eq!(readable_text(&link), "Contact us");
        link.href = None;
        assert_eq!(readable_text(&link), "Contact us");
    }

    #[test]
    fn buttons_fall_back_to_title() {
        let mut button = ClickTarget::new(ElementKind::Button, " ");
        assert_eq!(readable_text(&button), "Button");
        button.title = Some("Close dialog".into());
        assert_eq!(readable_text(&button), "Close dialog");
        button.text = "OK".into();
        assert_eq!(readable_text(&button), "OK");
    }

    #[test]
    fn form_controls_prefer_value_then_placeholder() {
        let mut input = ClickTarget::new(ElementKind::FormControl, "");
        assert_eq!(readable_text(&input), "Form field");
        input.placeholder = Some("Email".into());
        assert_eq!(readable_text(&input), "Email");
        input.value = Some("me@example.org".into());
        assert_eq!(readable_text(&input), "me@example.org");
    }

    #[test]
    fn exclusion_matches_widget_and_markers() {
        let rules = ExclusionRules::from_config(&WidgetConfig::default());
        let plain = ClickTarget::new(ElementKind::Paragraph, "Hello");
        assert!(!rules.excludes(&plain));

        let in_widget = ClickTarget {
            inside_widget: true,
            ..plain.clone()
        };
        assert!(rules.excludes(&in_widget));

        let skipped = plain.clone().with_marker("skip-reading");
        assert!(rules.excludes(&skipped));
    }

    #[test]
    fn widget_is_readable_when_skip_flag_is_off() {
        let config = WidgetConfig {
            skip_widget_menu: false,
            exclusion_markers: Vec::new(),
            ..WidgetConfig::default()
        };
        let rules = ExclusionRules::from_config(&config);
        let target = ClickTarget {
            inside_widget: true,
            ..ClickTarget::new(ElementKind::Button, "Reset")
        };
        assert!(!rules.excludes(&target));
    }

    #[test]
    fn page_reading_skips_short_fragments_and_labels_headings() {
        let fragments = vec![
            PageFragment::new(ElementKind::Heading(1), "Welcome"),
            PageFragment::new(ElementKind::Paragraph, "ok"),
            PageFragment::new(ElementKind::Paragraph, "  Opening hours are nine to five.  "),
            PageFragment::new(ElementKind::ListItem, "Tea"),
            PageFragment::new(ElementKind::Link, "Read more"),
        ];
        let reading = compose_page_reading("Library", &fragments, 3);
        assert_eq!(
            reading,
            "Page title: Library. Heading level 1: Welcome. Opening hours are nine to five. Read more. "
        );
    }

    #[test]
    fn suppression_only_when_reader_handled_click() {
        assert!(!ClickDisposition::Inactive.suppresses_default());
        assert!(!ClickDisposition::Excluded.suppresses_default());
        assert!(ClickDisposition::Silent.suppresses_default());
        assert!(ClickDisposition::Read("x".into()).suppresses_default());
    }
}
