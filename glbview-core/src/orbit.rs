/// Orbit camera rig: keeps the camera on a sphere around a target point.
///
/// The camera position is the source the rig reads every update, so any code
/// that moves the camera directly (transitions) must call [`OrbitRig::update`]
/// afterwards to fold the new position back into the orbit state.
use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::config::ViewerConfig;
use crate::projection::Camera;

const EPS: f32 = 1e-6;

/// Radius and angles of an offset around the +Y axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(v: &Vector3<f32>) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Self { radius, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// What a pointer drag does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    last: (f32, f32),
}

/// Pending input applied on the following updates
#[derive(Debug, Clone, Copy, Default)]
struct Delta {
    theta: f32,
    phi: f32,
    pan: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct OrbitRig {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    /// Pan across the screen plane instead of the horizontal plane
    pub screen_space_panning: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// 2.0 is one full turn every 30 seconds at 60 updates per second
    pub auto_rotate_speed: f32,
    delta: Delta,
    drag: Option<Drag>,
}

impl OrbitRig {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            target: Point3::origin(),
            enable_damping: true,
            damping_factor: config.damping_factor,
            enable_zoom: config.enable_zoom,
            enable_rotate: true,
            enable_pan: true,
            screen_space_panning: config.screen_space_panning,
            min_polar_angle: 0.0,
            max_polar_angle: config.max_polar_angle,
            auto_rotate: false,
            auto_rotate_speed: config.auto_rotate_speed,
            delta: Delta::default(),
            drag: None,
        }
    }

    fn auto_rotation_angle(&self) -> f32 {
        2.0 * PI / 60.0 / 60.0 * self.auto_rotate_speed
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta.phi -= angle;
    }

    /// Queue a pan of the target by a screen-space pixel delta
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        let height = viewport_height.max(1.0);
        let target_distance = (camera.position - self.target).norm() * (camera.fov / 2.0).tan();

        let right = camera.right();
        let left = right * (-2.0 * dx * target_distance / height);

        let up_axis = if self.screen_space_panning {
            right.cross(&(camera.target - camera.position)).try_normalize(EPS)
        } else {
            Some(camera.up.cross(&right))
        };
        let up = up_axis.unwrap_or_else(Vector3::zeros) * (2.0 * dy * target_distance / height);

        self.delta.pan += left + up;
    }

    pub fn begin_drag(&mut self, mode: DragMode, x: f32, y: f32) {
        let allowed = match mode {
            DragMode::Rotate => self.enable_rotate,
            DragMode::Pan => self.enable_pan,
        };
        if allowed {
            self.drag = Some(Drag { mode, last: (x, y) });
        }
    }

    pub fn drag_to(&mut self, x: f32, y: f32, viewport_height: f32, camera: &Camera) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = (x - drag.last.0, y - drag.last.1);
        drag.last = (x, y);
        let mode = drag.mode;

        match mode {
            DragMode::Rotate => {
                let height = viewport_height.max(1.0);
                self.rotate_left(2.0 * PI * dx / height);
                self.rotate_up(2.0 * PI * dy / height);
            }
            DragMode::Pan => self.pan(dx, dy, viewport_height, camera),
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Integrate pending input and auto-rotation, then place the camera.
    ///
    /// Returns true when the camera position changed.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = camera.position;
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(&offset);

        if self.auto_rotate && self.drag.is_none() {
            self.rotate_left(self.auto_rotation_angle());
        }

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        spherical.theta += self.delta.theta * step;
        spherical.phi += self.delta.phi * step;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        self.target += self.delta.pan * step;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta.theta *= decay;
            self.delta.phi *= decay;
            self.delta.pan *= decay;
        } else {
            self.delta = Delta::default();
        }

        (camera.position - before).norm_squared() > EPS
    }
}
