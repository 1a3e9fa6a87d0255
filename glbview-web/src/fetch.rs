/// Asset retrieval over the browser fetch API
use glbview_core::{ViewerError, ViewerResult};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

fn js_err(e: JsValue) -> ViewerError {
    ViewerError::Fetch(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// Fetch the whole body of `url` as bytes
pub async fn fetch_bytes(url: &str) -> ViewerResult<Vec<u8>> {
    let window = web_sys::window().ok_or_else(|| ViewerError::Fetch("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_err)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_err)?;

    if !response.ok() {
        return Err(ViewerError::Fetch(format!(
            "HTTP {} {} for {}",
            response.status(),
            response.status_text(),
            url
        )));
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
