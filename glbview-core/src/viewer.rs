/// The viewer session: one object owning every piece of mutable viewer state.
///
/// Hosts (browser, terminal) translate their input events into calls on
/// [`Viewer`], hand it asset completions, and call [`Viewer::frame`] once per
/// display refresh. Nothing here blocks or touches a platform API.
use log::{debug, error, info, warn};
use nalgebra::Point3;

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::geometry::Model;
use crate::orbit::{DragMode, OrbitRig};
use crate::projection::{aspect_ratio, Camera};
use crate::scene::{ModelNode, Scene, Surface};
use crate::tween::{Easing, TransitionSlot, Tween};

/// Shown in place of the viewer when the render backend is missing
pub const DIAGNOSTIC_MESSAGE: &str =
    "Your browser or graphics card does not seem to support WebGL 2, so the model viewer cannot start.";

/// Draws the scene for a host
pub trait RenderBackend {
    /// Resize the drawing buffer to match the surface
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, surface: &Surface, scene: &Scene, camera: &Camera);
}

/// Platform services needed before a session exists
pub trait Host {
    type Backend: RenderBackend;

    /// Probe run before anything else is created
    fn render_backend_available(&self) -> bool;

    /// Put a static message into the element with the given id
    fn show_diagnostic(&mut self, container_id: &str, message: &str);

    fn viewport(&self) -> (u32, u32);

    fn create_backend(&mut self, surface: &Surface) -> ViewerResult<Self::Backend>;
}

/// Run the capability check and build a session.
///
/// Returns `Ok(None)` after inserting the diagnostic when the probe fails;
/// in that case no surface, camera or backend is constructed.
pub fn boot<H: Host>(host: &mut H, config: ViewerConfig) -> ViewerResult<Option<Viewer<H::Backend>>> {
    if !host.render_backend_available() {
        warn!("Render backend unavailable; showing diagnostic");
        host.show_diagnostic(&config.diagnostic_container_id, DIAGNOSTIC_MESSAGE);
        return Ok(None);
    }

    let (width, height) = host.viewport();
    let surface = Surface::new(&config, width, height);
    let backend = host.create_backend(&surface)?;
    Ok(Some(Viewer::new(config, backend, width, height)))
}

/// Whether a transition step must be folded back into the orbit rig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSync {
    None,
    Rig,
}

/// Zoom factor for a wheel delta: farther for positive deltas, closer for negative
pub fn wheel_zoom_factor(delta_y: f64, step: f32) -> Option<f32> {
    if delta_y > 0.0 {
        Some(1.0 + step)
    } else if delta_y < 0.0 {
        Some(1.0 - step)
    } else {
        None
    }
}

/// Move `position` along the target ray so its distance is scaled by `factor`.
///
/// `None` when the camera sits on the target and has no direction to keep.
pub fn dolly_position(position: &Point3<f32>, target: &Point3<f32>, factor: f32) -> Option<Point3<f32>> {
    let offset = position - target;
    if offset.norm() < 1e-6 || !factor.is_finite() {
        return None;
    }
    Some(target + offset * factor)
}

pub struct Viewer<B> {
    config: ViewerConfig,
    surface: Surface,
    camera: Camera,
    rig: OrbitRig,
    scene: Scene,
    camera_transition: TransitionSlot<Point3<f32>, StepSync>,
    auto_rotate: bool,
    backend: B,
    frames: u64,
}

impl<B: RenderBackend> Viewer<B> {
    pub fn new(config: ViewerConfig, mut backend: B, width: u32, height: u32) -> Self {
        let surface = Surface::new(&config, width, height);
        backend.set_size(width, height);

        let mut camera = Camera::from_config(&config, width, height);
        let scene = Scene::new(&config);

        let rig = OrbitRig::new(&config);
        // No pending input yet; aim only, so the start position stays exact
        camera.look_at(rig.target);

        info!(
            "Viewer initialized at {}x{}, camera at {:?}",
            width, height, camera.position
        );

        Self {
            config,
            surface,
            camera,
            rig,
            scene,
            camera_transition: TransitionSlot::new(),
            auto_rotate: false,
            backend,
            frames: 0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn rig(&self) -> &OrbitRig {
        &self.rig
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Destination of the running camera transition, if any
    pub fn camera_transition_target(&self) -> Option<Point3<f32>> {
        self.camera_transition.target()
    }

    /// Completion of the asynchronous asset request.
    ///
    /// Failures are logged and leave the scene empty. Only the first
    /// successful completion is attached.
    pub fn on_asset_loaded(&mut self, result: Result<Model, ViewerError>) {
        match result {
            Ok(model) => {
                if self.scene.root.is_some() {
                    warn!("Model already attached; ignoring second completion");
                    return;
                }
                info!(
                    "Attaching model: {} meshes, {} triangles",
                    model.meshes.len(),
                    model.triangle_count()
                );
                self.scene.root = Some(ModelNode::new(model, &self.config));
            }
            Err(e) => error!("Failed to load {}: {}", self.config.asset_path, e),
        }
    }

    /// Advance transitions and the rig, then draw
    pub fn frame(&mut self, now_ms: f64) {
        if let Some((position, sync)) = self.camera_transition.advance(now_ms) {
            self.camera.position = position;
            if sync == StepSync::Rig {
                self.rig.update(&mut self.camera);
            }
        }
        self.rig.update(&mut self.camera);
        self.backend.render(&self.surface, &self.scene, &self.camera);
        self.frames += 1;
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.camera.aspect = aspect_ratio(width, height);
        self.camera.update_projection_matrix();
        self.surface.width = width;
        self.surface.height = height;
        self.backend.set_size(width, height);
    }

    /// Smoothed zoom from a wheel delta; returns whether a transition started
    pub fn on_wheel(&mut self, delta_y: f64, now_ms: f64) -> bool {
        if !self.rig.enable_zoom {
            debug!("Wheel ignored: zoom disabled");
            return false;
        }
        let Some(factor) = wheel_zoom_factor(delta_y, self.config.wheel_zoom_step) else {
            debug!("Wheel ignored: delta {}", delta_y);
            return false;
        };
        self.zoom_by(factor, self.config.wheel_zoom_duration_ms, now_ms)
    }

    pub fn zoom_in(&mut self, now_ms: f64) -> bool {
        self.zoom_by(self.config.zoom_in_factor, self.config.button_zoom_duration_ms, now_ms)
    }

    pub fn zoom_out(&mut self, now_ms: f64) -> bool {
        self.zoom_by(self.config.zoom_out_factor, self.config.button_zoom_duration_ms, now_ms)
    }

    /// Scale the camera-to-target distance by `factor` over `duration_ms`
    pub fn zoom_by(&mut self, factor: f32, duration_ms: f64, now_ms: f64) -> bool {
        let Some(destination) = dolly_position(&self.camera.position, &self.rig.target, factor) else {
            debug!("Zoom ignored: camera on target");
            return false;
        };
        self.start_camera_transition(destination, duration_ms, StepSync::Rig, now_ms);
        true
    }

    /// Ease the camera back to its initial position; the orbit target is left alone
    pub fn reset_camera(&mut self, now_ms: f64) {
        let destination = self.config.initial_camera_position;
        self.start_camera_transition(destination, self.config.reset_duration_ms, StepSync::None, now_ms);
    }

    fn start_camera_transition(&mut self, to: Point3<f32>, duration_ms: f64, sync: StepSync, now_ms: f64) {
        let tween = Tween::new(self.camera.position, to, duration_ms, Easing::QuadraticOut, now_ms);
        if self.camera_transition.start(tween, sync) {
            debug!("Camera transition replaced");
        }
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.set_auto_rotate(!self.auto_rotate);
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
        self.rig.auto_rotate = enabled;
    }

    /// Forward a speed to the rig unclamped; non-finite values are dropped
    pub fn set_auto_rotate_speed(&mut self, speed: f32) -> bool {
        if !speed.is_finite() {
            debug!("Auto-rotate speed ignored: {}", speed);
            return false;
        }
        self.rig.auto_rotate_speed = speed;
        true
    }

    /// Slider input as typed by the page
    pub fn set_auto_rotate_speed_input(&mut self, value: &str) -> bool {
        match value.trim().parse::<f32>() {
            Ok(speed) => self.set_auto_rotate_speed(speed),
            Err(_) => {
                debug!("Auto-rotate speed ignored: {:?}", value);
                false
            }
        }
    }

    pub fn pointer_down(&mut self, mode: DragMode, x: f32, y: f32) {
        self.rig.begin_drag(mode, x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let height = self.surface.height as f32;
        self.rig.drag_to(x, y, height, &self.camera);
    }

    pub fn pointer_up(&mut self) {
        self.rig.end_drag();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[derive(Default)]
    struct RecordingBackend {
        sizes: Vec<(u32, u32)>,
        renders: usize,
        renders_with_model: usize,
    }

    impl RenderBackend for RecordingBackend {
        fn set_size(&mut self, width: u32, height: u32) {
            self.sizes.push((width, height));
        }

        fn render(&mut self, _surface: &Surface, scene: &Scene, _camera: &Camera) {
            self.renders += 1;
            if scene.root.is_some() {
                self.renders_with_model += 1;
            }
        }
    }

    struct FakeHost {
        available: bool,
        backends_created: usize,
        diagnostics: Vec<(String, String)>,
    }

    impl Host for FakeHost {
        type Backend = RecordingBackend;

        fn render_backend_available(&self) -> bool {
            self.available
        }

        fn show_diagnostic(&mut self, container_id: &str, message: &str) {
            self.diagnostics.push((container_id.to_string(), message.to_string()));
        }

        fn viewport(&self) -> (u32, u32) {
            (800, 600)
        }

        fn create_backend(&mut self, _surface: &Surface) -> ViewerResult<RecordingBackend> {
            self.backends_created += 1;
            Ok(RecordingBackend::default())
        }
    }

    fn viewer() -> Viewer<RecordingBackend> {
        Viewer::new(ViewerConfig::default(), RecordingBackend::default(), 800, 600)
    }

    /// Run frames every 16ms from `from` until `until` inclusive
    fn run_frames(viewer: &mut Viewer<RecordingBackend>, from: f64, until: f64) {
        let mut t = from;
        while t <= until {
            viewer.frame(t);
            t += 16.0;
        }
        viewer.frame(until);
    }

    fn distance(viewer: &Viewer<RecordingBackend>) -> f32 {
        (viewer.camera().position - viewer.rig().target).norm()
    }

    #[test]
    fn test_boot_without_backend_shows_diagnostic_only() {
        let mut host = FakeHost {
            available: false,
            backends_created: 0,
            diagnostics: Vec::new(),
        };
        let session = boot(&mut host, ViewerConfig::default()).unwrap();
        assert!(session.is_none());
        assert_eq!(host.backends_created, 0);
        assert_eq!(
            host.diagnostics,
            vec![("container".to_string(), DIAGNOSTIC_MESSAGE.to_string())]
        );
    }

    #[test]
    fn test_boot_initializes_session() {
        let mut host = FakeHost {
            available: true,
            backends_created: 0,
            diagnostics: Vec::new(),
        };
        let viewer = boot(&mut host, ViewerConfig::default()).unwrap().unwrap();
        assert_eq!(host.backends_created, 1);
        assert!(host.diagnostics.is_empty());
        assert_eq!(viewer.backend().sizes, vec![(800, 600)]);
        assert!((viewer.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(viewer.surface().shadow_map_enabled);
        assert!(viewer.scene().root.is_none());
    }

    #[test]
    fn test_wheel_factor_sign() {
        assert_eq!(wheel_zoom_factor(120.0, 0.1), Some(1.1));
        assert_eq!(wheel_zoom_factor(-3.0, 0.1), Some(0.9));
        assert_eq!(wheel_zoom_factor(0.0, 0.1), None);
        assert_eq!(wheel_zoom_factor(f64::NAN, 0.1), None);
    }

    #[test]
    fn test_dolly_preserves_direction() {
        let position = Point3::new(1.0, 2.0, 3.0);
        let target = Point3::new(0.5, -1.0, 0.0);
        for factor in [0.9f32, 1.1] {
            let moved = dolly_position(&position, &target, factor).unwrap();
            let before = position - target;
            let after = moved - target;
            assert!((after.norm() - before.norm() * factor).abs() < 1e-5);
            assert!((after.normalize() - before.normalize()).norm() < 1e-5);
        }
        assert!(dolly_position(&target, &target, 1.1).is_none());
    }

    #[test]
    fn test_wheel_and_button_zoom_targets() {
        let mut viewer = viewer();
        viewer.rig.target = Point3::new(0.0, 1.0, 0.0);
        viewer.camera.position = Point3::new(3.0, 1.0, 4.0);

        assert!(viewer.on_wheel(100.0, 0.0));
        let target = viewer.camera_transition_target().unwrap();
        assert!(((target - viewer.rig.target).norm() - 5.5).abs() < 1e-5);

        assert!(viewer.on_wheel(-100.0, 0.0));
        let target = viewer.camera_transition_target().unwrap();
        assert!(((target - viewer.rig.target).norm() - 4.5).abs() < 1e-5);

        assert!(viewer.zoom_in(0.0));
        let target = viewer.camera_transition_target().unwrap();
        let direction = (target - viewer.rig.target).normalize();
        assert!((direction - Vector3::new(0.6, 0.0, 0.8)).norm() < 1e-5);
    }

    #[test]
    fn test_wheel_ignored_when_zoom_disabled() {
        let mut viewer = viewer();
        viewer.rig.enable_zoom = false;
        assert!(!viewer.on_wheel(100.0, 0.0));
        assert!(viewer.camera_transition_target().is_none());
        // Buttons are not gated by the rig flag
        assert!(viewer.zoom_out(0.0));
    }

    #[test]
    fn test_wheel_zoom_finishes_within_duration() {
        let mut viewer = viewer();
        viewer.on_wheel(1.0, 0.0);
        run_frames(&mut viewer, 0.0, 350.0);
        assert!((distance(&viewer) - 5.5).abs() < 1e-4);
        assert!(viewer.camera_transition_target().is_none());
    }

    #[test]
    fn test_newer_transition_replaces_older() {
        let mut viewer = viewer();
        viewer.zoom_out(0.0);
        run_frames(&mut viewer, 0.0, 100.0);
        viewer.zoom_in(100.0);
        run_frames(&mut viewer, 100.0, 700.0);

        // Zoom in started from wherever the zoom out had reached
        let d = distance(&viewer);
        assert!(d < 5.5 * 0.9 + 1e-4);
        assert!(d > 5.0 * 0.9 - 1e-4);
    }

    #[test]
    fn test_reset_from_anywhere() {
        let mut viewer = viewer();
        viewer.camera.position = Point3::new(-7.0, 3.0, 2.0);
        viewer.rig.update(&mut viewer.camera);
        viewer.reset_camera(0.0);

        run_frames(&mut viewer, 0.0, 500.0);
        assert!(viewer.camera_transition_target().is_some());
        run_frames(&mut viewer, 500.0, 1000.0);
        assert!((viewer.camera().position - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-4);
    }

    #[test]
    fn test_reset_keeps_target() {
        let mut viewer = viewer();
        viewer.rig.target = Point3::new(1.0, 0.0, 0.0);
        viewer.reset_camera(0.0);
        run_frames(&mut viewer, 0.0, 1000.0);
        assert_eq!(viewer.rig().target, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(viewer.camera().target, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_zoom_out_then_reset_scenario() {
        let mut viewer = viewer();
        assert_eq!(viewer.camera().position, Point3::new(0.0, 0.0, 5.0));

        viewer.zoom_out(0.0);
        run_frames(&mut viewer, 0.0, 500.0);
        assert!((distance(&viewer) - 5.5).abs() < 1e-4);
        let direction = (viewer.camera().position - viewer.rig().target).normalize();
        assert!((direction - Vector3::z()).norm() < 1e-4);

        viewer.reset_camera(600.0);
        run_frames(&mut viewer, 600.0, 1600.0);
        assert!((viewer.camera().position - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-4);
    }

    #[test]
    fn test_auto_rotate_settings_idempotent() {
        let mut viewer = viewer();
        viewer.set_auto_rotate(true);
        viewer.set_auto_rotate(true);
        assert!(viewer.auto_rotate());
        assert!(viewer.rig().auto_rotate);

        assert!(viewer.set_auto_rotate_speed(5.0));
        assert!(viewer.set_auto_rotate_speed(5.0));
        assert_eq!(viewer.rig().auto_rotate_speed, 5.0);

        assert!(!viewer.toggle_auto_rotate());
        assert!(!viewer.rig().auto_rotate);
        assert!(viewer.toggle_auto_rotate());
    }

    #[test]
    fn test_speed_slider_input() {
        let mut viewer = viewer();
        assert!(viewer.set_auto_rotate_speed_input(" 3.5 "));
        assert_eq!(viewer.rig().auto_rotate_speed, 3.5);
        assert!(viewer.set_auto_rotate_speed_input("-20"));
        assert_eq!(viewer.rig().auto_rotate_speed, -20.0);

        for bad in ["", "fast", "NaN", "inf"] {
            assert!(!viewer.set_auto_rotate_speed_input(bad));
        }
        assert_eq!(viewer.rig().auto_rotate_speed, -20.0);
    }

    #[test]
    fn test_resize_idempotent() {
        let mut viewer = viewer();
        viewer.on_resize(1024, 512);
        let aspect = viewer.camera().aspect;
        let projection = *viewer.camera().projection_matrix();
        viewer.on_resize(1024, 512);

        assert_eq!(viewer.camera().aspect, aspect);
        assert_eq!(*viewer.camera().projection_matrix(), projection);
        assert_eq!((viewer.surface().width, viewer.surface().height), (1024, 512));
        assert_eq!(viewer.backend().sizes.last(), Some(&(1024, 512)));
        assert!((aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_initial_camera_is_exact() {
        let viewer = viewer();
        assert_eq!(viewer.camera().position, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(viewer.camera().target, Point3::origin());
    }

    #[test]
    fn test_zero_width_resize() {
        let mut viewer = Viewer::new(ViewerConfig::default(), RecordingBackend::default(), 0, 600);
        viewer.frame(0.0);
        assert!(viewer.camera().aspect > 0.0);

        viewer.on_resize(0, 0);
        viewer.frame(16.0);
        assert_eq!(viewer.camera().aspect, 1.0);
        assert!(viewer.camera().projection_matrix().iter().all(|v| v.is_finite()));
        assert_eq!(viewer.backend().renders, 2);

        viewer.on_resize(800, 400);
        viewer.frame(32.0);
        assert!((viewer.camera().aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_frames_continue_after_failed_load() {
        let mut viewer = viewer();
        viewer.on_asset_loaded(Err(ViewerError::Fetch("HTTP 404".to_string())));
        for i in 0..100 {
            viewer.frame(i as f64 * 16.0);
            assert!(viewer.scene().root.is_none());
        }
        assert_eq!(viewer.frames(), 100);
        assert_eq!(viewer.backend().renders, 100);
        assert_eq!(viewer.backend().renders_with_model, 0);
    }

    #[test]
    fn test_model_attached_once() {
        let mut viewer = viewer();
        viewer.frame(0.0);
        viewer.on_asset_loaded(Ok(Model::default()));
        viewer.on_asset_loaded(Ok(Model {
            meshes: vec![crate::geometry::Mesh::new(), crate::geometry::Mesh::new()],
        }));
        viewer.frame(16.0);

        let root = viewer.scene().root.as_ref().unwrap();
        assert!(root.model.meshes.is_empty());
        assert_eq!(root.scale, Vector3::new(1.45, 1.45, 1.45));
        assert_eq!(viewer.backend().renders_with_model, 1);
    }

    #[test]
    fn test_pointer_rotation_through_viewer() {
        let mut viewer = viewer();
        viewer.pointer_down(DragMode::Rotate, 100.0, 100.0);
        viewer.pointer_move(160.0, 100.0);
        viewer.pointer_up();
        run_frames(&mut viewer, 0.0, 1000.0);

        assert!(viewer.camera().position.x.abs() > 1.0);
        assert!((distance(&viewer) - 5.0).abs() < 1e-3);
    }
}
