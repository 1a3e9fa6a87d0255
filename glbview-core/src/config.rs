/// Fixed viewer configuration
use nalgebra::{Point3, Vector3};

/// Linear RGB color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a 0xRRGGBB literal
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Every constant the viewer is initialized with.
///
/// Nothing here is read from files or the environment; hosts start from
/// [`ViewerConfig::default`] and may only swap the asset path.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub asset_path: String,
    /// Element that receives the diagnostic when the render backend is missing
    pub diagnostic_container_id: String,
    pub background: Color,
    pub shadow_map_enabled: bool,

    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_camera_position: Point3<f32>,

    pub ambient_color: Color,
    pub ambient_intensity: f32,

    pub model_scale: Vector3<f32>,
    pub model_rotation: Vector3<f32>,

    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub screen_space_panning: bool,
    pub max_polar_angle: f32,
    pub auto_rotate_speed: f32,

    pub wheel_zoom_step: f32,
    pub wheel_zoom_duration_ms: f64,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub button_zoom_duration_ms: f64,
    pub reset_duration_ms: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: "/assets/model.glb".to_string(),
            diagnostic_container_id: "container".to_string(),
            background: Color::from_hex(0x191919),
            shadow_map_enabled: true,

            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_camera_position: Point3::new(0.0, 0.0, 5.0),

            ambient_color: Color::white(),
            ambient_intensity: 3.0,

            model_scale: Vector3::new(1.45, 1.45, 1.45),
            model_rotation: Vector3::new(0.75, 0.0, 0.0),

            damping_factor: 0.25,
            enable_zoom: true,
            screen_space_panning: false,
            max_polar_angle: std::f32::consts::PI,
            auto_rotate_speed: 2.0,

            wheel_zoom_step: 0.1,
            wheel_zoom_duration_ms: 350.0,
            zoom_in_factor: 0.9,
            zoom_out_factor: 1.1,
            button_zoom_duration_ms: 500.0,
            reset_duration_ms: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_from_hex() {
        let color = Color::from_hex(0x191919);
        assert!((color.r - 25.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.r, color.g);
        assert_eq!(color.g, color.b);
    }
}
