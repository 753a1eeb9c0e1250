//! DOM element bindings.
//!
//! All fields are resolved once at startup. To add a UI element, add a field
//! here and bind it in `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, HtmlInputElement};

// ── Helpers ──

pub fn by_id(id: &str) -> Option<Element> {
    gloo_utils::document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn clear(el: &Element) {
    el.set_inner_html("");
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

/// Create `<tag class="cls">text</tag>`.
pub fn create_text_element(tag: &str, cls: &str, text: &str) -> Result<Element, JsValue> {
    let el = gloo_utils::document().create_element(tag)?;
    add_class(&el, cls);
    el.set_text_content(Some(text));
    Ok(el)
}

pub fn window() -> web_sys::Window {
    gloo_utils::window()
}

// ── Elements struct ──

/// Every DOM node the client touches. Cheap to clone (JS references).
#[derive(Clone)]
pub struct Elements {
    pub pending_view: Element,
    pub data_view: Element,

    pub message_input: HtmlInputElement,
    pub wave_btn: HtmlElement,
    pub connect_btn: HtmlElement,
    pub notice: Element,

    pub wave_count: Element,
    pub wave_list: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after the document is loaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            pending_view: get_el!("pendingView"),
            data_view: get_el!("dataView"),

            message_input: get_input!("messageInput"),
            wave_btn: get_html!("waveBtn"),
            connect_btn: get_html!("connectBtn"),
            notice: get_el!("notice"),

            wave_count: get_el!("waveCount"),
            wave_list: get_el!("waveList"),
        })
    }
}
