/// Render surface state and the scene graph handed to render backends
use nalgebra::{Matrix4, Vector3};

use crate::config::{Color, ViewerConfig};
use crate::geometry::Model;
use crate::transform::{model_matrix, EulerRotation};

/// Pixel size and clear state of the render target
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// Carried for parity with the page setup; no light casts shadows
    pub shadow_map_enabled: bool,
}

impl Surface {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: config.background,
            shadow_map_enabled: config.shadow_map_enabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    /// Light contribution per channel, before any clamping by the backend
    pub fn radiance(&self) -> [f32; 3] {
        [
            self.color.r * self.intensity,
            self.color.g * self.intensity,
            self.color.b * self.intensity,
        ]
    }
}

/// The loaded model placed in the world
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub model: Model,
    pub scale: Vector3<f32>,
    pub rotation: EulerRotation,
}

impl ModelNode {
    pub fn new(model: Model, config: &ViewerConfig) -> Self {
        Self {
            model,
            scale: config.model_scale,
            rotation: EulerRotation::from(config.model_rotation),
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        model_matrix(&self.scale, &self.rotation)
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    pub ambient: AmbientLight,
    /// Empty until the asset load completes
    pub root: Option<ModelNode>,
}

impl Scene {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            background: config.background,
            ambient: AmbientLight {
                color: config.ambient_color,
                intensity: config.ambient_intensity,
            },
            root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_model_node_defaults() {
        let config = ViewerConfig::default();
        let node = ModelNode::new(Model::default(), &config);
        assert_eq!(node.scale, Vector3::new(1.45, 1.45, 1.45));
        assert_eq!(node.rotation, EulerRotation::new(0.75, 0.0, 0.0));

        // Uniform scale: a unit X vector only grows, the X rotation leaves it alone
        let p = node.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 1.45).abs() < 1e-5);
    }

    #[test]
    fn test_scene_starts_empty() {
        let scene = Scene::new(&ViewerConfig::default());
        assert!(scene.root.is_none());
        assert_eq!(scene.ambient.radiance(), [3.0, 3.0, 3.0]);
    }
}
