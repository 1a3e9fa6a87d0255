/// Fullscreen toggling through whichever entry point the browser exposes
use glbview_core::fullscreen::{self, FullscreenAction, ELEMENT_PROPERTIES};
use js_sys::{Function, Promise, Reflect};
use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Document;

fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn is_fullscreen(document: &Document) -> bool {
    ELEMENT_PROPERTIES
        .iter()
        .any(|name| property(document, name).is_some())
}

/// Enter fullscreen on the root element, or leave it. Silently does nothing
/// when no entry point exists.
pub fn toggle(document: &Document) {
    let action = fullscreen::plan(is_fullscreen(document));
    let target: JsValue = match action {
        FullscreenAction::Enter => match document.document_element() {
            Some(root) => root.into(),
            None => return,
        },
        FullscreenAction::Exit => document.clone().into(),
    };

    let Some(name) = fullscreen::resolve(action.entry_points(), |name| {
        property(&target, name).map_or(false, |v| v.is_function())
    }) else {
        debug!("No fullscreen entry point for {:?}", action);
        return;
    };

    let Some(method) = property(&target, name).and_then(|v| v.dyn_into::<Function>().ok()) else {
        return;
    };

    match method.call0(&target) {
        Ok(result) => {
            // Standard entry points return a promise that rejects outside user gestures
            if let Ok(promise) = result.dyn_into::<Promise>() {
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        debug!("Fullscreen request rejected: {:?}", e);
                    }
                });
            }
        }
        Err(e) => debug!("{} failed: {:?}", name, e),
    }
}
