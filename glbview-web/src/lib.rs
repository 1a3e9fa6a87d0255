/// glbview web - browser host for the model viewer
///
/// Boots a viewer session on a WebGL2 canvas, fetches the model in the
/// background, wires the page controls, and drives frames from
/// `requestAnimationFrame`.

pub mod console;
pub mod events;
pub mod fetch;
pub mod fullscreen;
pub mod gl;
pub mod host;

use std::cell::RefCell;
use std::rc::Rc;

use glbview_core::{boot, load_model, ViewerConfig};
use log::{error, info, LevelFilter};
use wasm_bindgen::prelude::*;

use crate::events::SharedViewer;
use crate::host::BrowserHost;

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Frame loop for the lifetime of the page; the next frame is scheduled
/// before the current one runs
fn start_render_loop(viewer: SharedViewer) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();

    *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(e) = request_animation_frame(cb) {
                error!("Failed to schedule frame: {:?}", e);
            }
        }
        viewer.borrow_mut().frame(timestamp);
    }));

    let scheduled = match callback.borrow().as_ref() {
        Some(cb) => request_animation_frame(cb).map(|_| ()),
        None => Ok(()),
    };
    scheduled
}

fn load_asset(viewer: SharedViewer, path: String) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = match fetch::fetch_bytes(&path).await {
            Ok(bytes) => load_model(&bytes),
            Err(e) => Err(e),
        };
        viewer.borrow_mut().on_asset_loaded(result);
    });
}

/// Capability check, session setup, asset request, bindings, frame loop
pub fn start(config: ViewerConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let mut host = BrowserHost::new(window.clone(), document.clone());
    let asset_path = config.asset_path.clone();
    let viewer = match boot(&mut host, config) {
        Ok(Some(viewer)) => viewer,
        Ok(None) => return Ok(()),
        Err(e) => return Err(JsValue::from_str(&e.to_string())),
    };

    let canvas = viewer.backend().canvas().clone();
    let viewer: SharedViewer = Rc::new(RefCell::new(viewer));

    info!("Requesting {}", asset_path);
    load_asset(viewer.clone(), asset_path);

    events::register(&viewer, &window, &document, &canvas)?;
    start_render_loop(viewer)
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console::init(LevelFilter::Info);

    start(ViewerConfig::default())
}
