/// Browser implementation of the viewer host: capability probe, diagnostic, canvas
use glbview_core::{Host, Surface, ViewerError, ViewerResult};
use js_sys::Reflect;
use log::error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlCanvasElement, Window};

use crate::gl::WebGlRenderer;

/// Inner window size in CSS pixels
pub fn viewport(window: &Window) -> (u32, u32) {
    let dimension = |v: Result<JsValue, JsValue>| {
        v.ok()
            .and_then(|v| v.as_f64())
            .map_or(0, |v| v.max(0.0) as u32)
    };
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

pub struct BrowserHost {
    window: Window,
    document: Document,
}

impl BrowserHost {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    fn create_canvas(&self) -> ViewerResult<HtmlCanvasElement> {
        self.document
            .create_element("canvas")
            .map_err(|e| ViewerError::Backend(format!("{:?}", e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ViewerError::Backend("created element is not a canvas".to_string()))
    }
}

impl Host for BrowserHost {
    type Backend = WebGlRenderer;

    fn render_backend_available(&self) -> bool {
        let has_api = Reflect::has(&self.window, &JsValue::from_str("WebGL2RenderingContext"))
            .unwrap_or(false);
        if !has_api {
            return false;
        }
        // A detached probe canvas, so nothing is added to the page on failure
        match self.create_canvas() {
            Ok(canvas) => matches!(canvas.get_context("webgl2"), Ok(Some(_))),
            Err(_) => false,
        }
    }

    fn show_diagnostic(&mut self, container_id: &str, message: &str) {
        let Some(container) = self.document.get_element_by_id(container_id) else {
            error!("{} (no #{} element to show it in)", message, container_id);
            return;
        };
        let Ok(warning) = self.document.create_element("div") else {
            return;
        };
        warning.set_id("webgl-error-message");
        let _ = warning.set_attribute(
            "style",
            "font-family:monospace;font-size:13px;text-align:center;background:#fff;color:#000;\
             padding:1.5em;width:400px;margin:5em auto 0",
        );
        warning.set_text_content(Some(message));
        if let Err(e) = container.append_child(&warning) {
            error!("Failed to insert diagnostic: {:?}", e);
        }
    }

    fn viewport(&self) -> (u32, u32) {
        viewport(&self.window)
    }

    fn create_backend(&mut self, _surface: &Surface) -> ViewerResult<WebGlRenderer> {
        let canvas = self.create_canvas()?;
        let body = self
            .document
            .body()
            .ok_or_else(|| ViewerError::Backend("document has no body".to_string()))?;
        body.append_child(&canvas)
            .map_err(|e| ViewerError::Backend(format!("{:?}", e)))?;
        WebGlRenderer::new(canvas)
    }
}
