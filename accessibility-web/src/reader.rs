//! DOM extraction for the screen reader: clicked elements become
//! [`ClickTarget`]s, the document becomes a list of [`PageFragment`]s.
use accessibility_core::{ClickTarget, ElementKind, PageFragment, ids};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

const PAGE_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, a";

fn attr(el: &Element, name: &str) -> Option<String> {
    el.get_attribute(name)
}

fn control_value(el: &Element) -> Option<String> {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        return Some(area.value());
    }
    el.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
}

/// Class names and ids of `el` and every ancestor.
fn ancestry_markers(el: &Element) -> Vec<String> {
    let mut markers = Vec::new();
    let mut current = Some(el.clone());
    while let Some(node) = current {
        let id = node.id();
        if !id.is_empty() {
            markers.push(id);
        }
        let classes = node.class_list();
        for i in 0..classes.length() {
            if let Some(class) = classes.item(i) {
                markers.push(class);
            }
        }
        current = node.parent_element();
    }
    markers
}

fn inside_widget(el: &Element) -> bool {
    el.closest(&format!(".{}", ids::WIDGET_MARKER))
        .ok()
        .flatten()
        .is_some()
}

/// Describe a clicked element for the reader.
#[must_use]
pub fn click_target(el: &Element) -> ClickTarget {
    let kind = ElementKind::from_tag(&el.tag_name());
    ClickTarget {
        kind: Some(kind),
        text: el.text_content().unwrap_or_default(),
        alt: attr(el, "alt"),
        href: attr(el, "href"),
        title: attr(el, "title"),
        value: if kind == ElementKind::FormControl {
            control_value(el)
        } else {
            None
        },
        placeholder: attr(el, "placeholder"),
        inside_widget: inside_widget(el),
        markers: ancestry_markers(el),
    }
}

/// Readable blocks in document order, skipping the widget and any element
/// under one of `exclusion_markers`.
#[must_use]
pub fn page_fragments(document: &Document, exclusion_markers: &[String]) -> Vec<PageFragment> {
    let Ok(nodes) = document.query_selector_all(PAGE_SELECTOR) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .filter(|el| !inside_widget(el))
        .filter(|el| {
            let markers = ancestry_markers(el);
            !markers.iter().any(|m| exclusion_markers.contains(m))
        })
        .map(|el| {
            PageFragment::new(
                ElementKind::from_tag(&el.tag_name()),
                el.text_content().unwrap_or_default(),
            )
        })
        .collect()
}
