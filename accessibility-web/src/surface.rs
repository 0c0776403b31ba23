//! The live page as a [`PageSurface`].
use accessibility_core::{Feature, FilterScope, PageSurface, ScaleMechanism, ids};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Element, Event, HtmlElement};

use crate::dom;

pub type ClickHandler = Closure<dyn FnMut(Event)>;

pub struct DomSurface {
    document: Document,
    reader_listener: ClickHandler,
    listener_attached: bool,
}

impl DomSurface {
    /// `reader_listener` is registered on the document in the capture phase
    /// while the screen reader is active.
    #[must_use]
    pub const fn new(document: Document, reader_listener: ClickHandler) -> Self {
        Self {
            document,
            reader_listener,
            listener_attached: false,
        }
    }

    fn body(&self) -> Option<HtmlElement> {
        self.document.body()
    }

    fn root(&self) -> Option<HtmlElement> {
        self.document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// Top-level page content: body children other than the widget and
    /// the toast overlay.
    fn page_siblings(&self) -> Vec<Element> {
        let Some(body) = self.body() else {
            return Vec::new();
        };
        let children = body.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|el| {
                let classes = el.class_list();
                !classes.contains(ids::WIDGET_MARKER) && !classes.contains(ids::TOAST_MARKER)
            })
            .collect()
    }

    fn any_sibling_filter(&self) -> bool {
        self.root().is_some_and(|root| {
            Feature::ALL
                .into_iter()
                .filter(|f| f.is_color_filter())
                .any(|f| root.class_list().contains(f.marker()))
        })
    }

    fn update_image_counters(&self, siblings: &[Element]) {
        let counter = self.any_sibling_filter();
        for sibling in siblings {
            let Ok(images) = sibling.query_selector_all("img") else {
                continue;
            };
            for i in 0..images.length() {
                if let Some(img) = images.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    dom::set_class(&img, ids::FILTER_COUNTER_CLASS, counter);
                }
            }
        }
    }
}

impl PageSurface for DomSurface {
    fn set_marker(&mut self, marker: &str, enabled: bool) {
        if let Some(body) = self.body() {
            dom::set_class(&body, marker, enabled);
        }
    }

    fn has_marker(&self, marker: &str) -> bool {
        let on_body = self
            .body()
            .is_some_and(|body| body.class_list().contains(marker));
        let on_root = self
            .root()
            .is_some_and(|root| root.class_list().contains(marker));
        on_body || on_root
    }

    fn set_page_filter(&mut self, marker: &str, enabled: bool, scope: FilterScope) {
        match scope {
            FilterScope::Body => self.set_marker(marker, enabled),
            FilterScope::PageSiblings => {
                // <html> carries the filter state; the siblings carry the style.
                if let Some(root) = self.root() {
                    dom::set_class(&root, marker, enabled);
                }
                let siblings = self.page_siblings();
                for sibling in &siblings {
                    dom::set_class(sibling, marker, enabled);
                }
                self.update_image_counters(&siblings);
            }
        }
    }

    fn set_indicator_active(&mut self, id: &str, active: bool) {
        if let Some(el) = self.by_id(id) {
            dom::set_class(&el, ids::ACTIVE_CLASS, active);
        }
    }

    fn set_indicator_text(&mut self, id: &str, text: &str) {
        if let Some(el) = self.by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_control_visible(&mut self, id: &str, visible: bool) {
        let Some(el) = self
            .by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = el.style();
        let _ = if visible {
            style.remove_property("display").map(drop)
        } else {
            style.set_property("display", "none")
        };
    }

    fn detect_scale_mechanism(&self) -> ScaleMechanism {
        let supports_zoom = self
            .body()
            .is_some_and(|body| js_sys::Reflect::has(&body.style(), &"zoom".into()).unwrap_or(false));
        if supports_zoom {
            ScaleMechanism::Zoom
        } else {
            ScaleMechanism::RootFontSize
        }
    }

    fn apply_zoom(&mut self, factor: Option<f64>) {
        let Some(body) = self.body() else {
            return;
        };
        let style = body.style();
        let _ = match factor {
            Some(factor) => style.set_property("zoom", &factor.to_string()),
            None => style.remove_property("zoom").map(drop),
        };
    }

    fn computed_root_font_size(&self) -> Option<f64> {
        let root = self.document.document_element()?;
        let computed = dom::window()?.get_computed_style(&root).ok()??;
        let size = computed.get_property_value("font-size").ok()?;
        dom::parse_px(&size)
    }

    fn set_root_font_size(&mut self, px: Option<f64>) {
        let Some(root) = self.root() else {
            return;
        };
        let style = root.style();
        let _ = match px {
            Some(px) => style.set_property("font-size", &format!("{px}px")),
            None => style.remove_property("font-size").map(drop),
        };
    }

    fn attach_reader_listener(&mut self) {
        if self.listener_attached {
            return;
        }
        let attached = self.document.add_event_listener_with_callback_and_bool(
            "click",
            self.reader_listener.as_ref().unchecked_ref(),
            true,
        );
        match attached {
            Ok(()) => self.listener_attached = true,
            Err(err) => log::error!(
                "could not attach screen reader listener: {}",
                dom::js_error_message(&err)
            ),
        }
    }

    fn detach_reader_listener(&mut self) {
        if !self.listener_attached {
            return;
        }
        let _ = self.document.remove_event_listener_with_callback_and_bool(
            "click",
            self.reader_listener.as_ref().unchecked_ref(),
            true,
        );
        self.listener_attached = false;
    }
}
