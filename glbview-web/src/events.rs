/// DOM event bindings for the viewer page
use std::cell::RefCell;
use std::rc::Rc;

use glbview_core::{DragMode, RenderBackend, Viewer};
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, HtmlCanvasElement, HtmlInputElement,
    PointerEvent, UiEvent, WheelEvent, Window,
};

use crate::gl::WebGlRenderer;

pub type SharedViewer = Rc<RefCell<Viewer<WebGlRenderer>>>;

/// Page controls the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Reset,
    ToggleFullscreen,
    ToggleAutoRotate,
    ZoomIn,
    ZoomOut,
    RotationSpeed,
}

/// Element id, event type and control for every page control
pub const CONTROLS: &[(&str, &str, Control)] = &[
    ("reset-button", "click", Control::Reset),
    ("toggle-fullscreen", "click", Control::ToggleFullscreen),
    ("toggle-autorotate", "change", Control::ToggleAutoRotate),
    ("zoomInButton", "click", Control::ZoomIn),
    ("zoomOutButton", "click", Control::ZoomOut),
    ("rotation-speed-slider", "input", Control::RotationSpeed),
];

/// Document-level wheel events; the second is the legacy Firefox alias
pub const WHEEL_EVENTS: &[&str] = &["wheel", "DOMMouseScroll"];

/// Apply a session-level control. Fullscreen lives outside the session and
/// is handled by the caller.
pub fn apply<B: RenderBackend>(viewer: &mut Viewer<B>, control: Control, value: Option<&str>, now_ms: f64) {
    match control {
        Control::Reset => viewer.reset_camera(now_ms),
        Control::ToggleAutoRotate => {
            viewer.toggle_auto_rotate();
        }
        Control::ZoomIn => {
            viewer.zoom_in(now_ms);
        }
        Control::ZoomOut => {
            viewer.zoom_out(now_ms);
        }
        Control::RotationSpeed => {
            if let Some(value) = value {
                viewer.set_auto_rotate_speed_input(value);
            }
        }
        Control::ToggleFullscreen => {}
    }
}

/// Pointer button to drag behaviour: primary rotates, secondary pans
pub fn drag_mode(button: i16) -> Option<DragMode> {
    match button {
        0 => Some(DragMode::Rotate),
        2 => Some(DragMode::Pan),
        _ => None,
    }
}

pub fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn listen(
    target: &EventTarget,
    event: &str,
    passive: Option<bool>,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    match passive {
        Some(passive) => {
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                event,
                closure.as_ref().unchecked_ref(),
                &options,
            )?;
        }
        None => {
            target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        }
    }
    // Listeners live as long as the page
    closure.forget();
    Ok(())
}

/// Register every listener the page needs
pub fn register(
    viewer: &SharedViewer,
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    for &(id, event, control) in CONTROLS {
        let Some(element) = document.get_element_by_id(id) else {
            warn!("Control #{} not found; {:?} unavailable", id, control);
            continue;
        };

        let viewer = viewer.clone();
        let doc = document.clone();
        let input = element.clone().dyn_into::<HtmlInputElement>().ok();
        listen(&element, event, None, move |_event| {
            if control == Control::ToggleFullscreen {
                crate::fullscreen::toggle(&doc);
                return;
            }
            let value = input.as_ref().map(|i| i.value());
            apply(&mut *viewer.borrow_mut(), control, value.as_deref(), now());
        })?;
    }

    {
        let viewer = viewer.clone();
        let win = window.clone();
        listen(window, "resize", None, move |_event| {
            let (width, height) = crate::host::viewport(&win);
            viewer.borrow_mut().on_resize(width, height);
        })?;
    }

    for &event in WHEEL_EVENTS {
        let viewer = viewer.clone();
        listen(document, event, Some(false), move |event| {
            event.prevent_default();
            let delta = match event.dyn_ref::<WheelEvent>() {
                Some(wheel) => wheel.delta_y(),
                None => event.dyn_ref::<UiEvent>().map_or(0.0, |e| e.detail() as f64),
            };
            viewer.borrow_mut().on_wheel(delta, now());
        })?;
    }

    register_pointer(viewer, canvas)
}

fn register_pointer(viewer: &SharedViewer, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let _ = canvas.style().set_property("touch-action", "none");

    listen(canvas, "contextmenu", None, |event| event.prevent_default())?;

    {
        let viewer = viewer.clone();
        let target = canvas.clone();
        listen(canvas, "pointerdown", None, move |event| {
            let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
                return;
            };
            let Some(mode) = drag_mode(pointer.button()) else {
                return;
            };
            let _ = target.set_pointer_capture(pointer.pointer_id());
            viewer
                .borrow_mut()
                .pointer_down(mode, pointer.client_x() as f32, pointer.client_y() as f32);
        })?;
    }

    {
        let viewer = viewer.clone();
        listen(canvas, "pointermove", None, move |event| {
            if let Some(pointer) = event.dyn_ref::<PointerEvent>() {
                viewer
                    .borrow_mut()
                    .pointer_move(pointer.client_x() as f32, pointer.client_y() as f32);
            }
        })?;
    }

    for event in ["pointerup", "pointercancel"] {
        let viewer = viewer.clone();
        listen(canvas, event, None, move |_event| viewer.borrow_mut().pointer_up())?;
    }

    Ok(())
}
