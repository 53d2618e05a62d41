use stories::{EntityDecoder, HtmlEntityDecoder};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::{Document, Event, EventTarget, HtmlElement, HtmlTextAreaElement};

use crate::error::{AppError, js_message};

/// Adds a listener that lives as long as the page.
pub fn listen<T, F>(target: &T, event: &str, handler: F)
where
    T: AsRef<EventTarget>,
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    if let Err(err) = target
        .as_ref()
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        tracing::warn!(event, error = %js_message(&err), "could not add listener");
    }
    closure.forget();
}

pub fn document() -> Result<Document, AppError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| AppError::MissingElement("document".to_string()))
}

pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, AppError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| AppError::MissingElement(id.to_string()))
}

pub fn viewport_width_px() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(f64::INFINITY)
}

/// Rendered height of the element with `id`, or NaN when it is absent.
pub fn element_height_px(document: &Document, id: &str) -> f64 {
    document
        .get_element_by_id(id)
        .map(|el| el.get_bounding_client_rect().height())
        .unwrap_or(f64::NAN)
}

/// Replaces the content of `container_id` with a plain text message.
pub fn show_fallback(document: &Document, container_id: &str, message: &str) {
    let Some(container) = document.get_element_by_id(container_id) else {
        tracing::warn!(container_id, "map container missing, cannot show fallback");
        return;
    };
    container.set_inner_html("");
    if let Ok(p) = document.create_element("p") {
        p.set_class_name("map-fallback");
        p.set_text_content(Some(message));
        if let Err(err) = container.append_child(&p) {
            tracing::warn!(container_id, error = %js_message(&err), "could not show fallback");
        }
    }
}

pub fn set_cursor(el: &HtmlElement, cursor: &str) {
    if let Err(err) = el.style().set_property("cursor", cursor) {
        tracing::debug!(cursor, error = %js_message(&err), "could not set cursor");
    }
}

/// Decodes entities the way the browser's HTML parser does, using a
/// detached `<textarea>` whose content is never parsed as markup.
/// Falls back to the built-in table when no textarea can be created.
#[derive(Debug, Clone)]
pub enum PageDecoder {
    Textarea(HtmlTextAreaElement),
    Builtin(HtmlEntityDecoder),
}

impl PageDecoder {
    pub fn new(document: &Document) -> Self {
        document
            .create_element("textarea")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
            .map(PageDecoder::Textarea)
            .unwrap_or(PageDecoder::Builtin(HtmlEntityDecoder))
    }
}

impl EntityDecoder for PageDecoder {
    fn decode(&self, raw: &str) -> String {
        match self {
            PageDecoder::Textarea(textarea) => {
                textarea.set_inner_html(raw);
                let decoded = textarea.value();
                textarea.set_inner_html("");
                decoded
            }
            PageDecoder::Builtin(decoder) => decoder.decode(raw),
        }
    }
}
