/// Perspective camera and screen projection
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::ViewerConfig;

/// Perspective camera looking at a target point
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::origin(),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn from_config(config: &ViewerConfig, width: u32, height: u32) -> Self {
        let mut camera = Self::new(
            config.fov_degrees,
            aspect_ratio(width, height),
            config.near,
            config.far,
        );
        camera.position = config.initial_camera_position;
        camera
    }

    /// Recompute the cached projection after changing fov, aspect or clip planes
    pub fn update_projection_matrix(&mut self) {
        self.projection = Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Unit vector pointing to the camera's right in world space
    pub fn right(&self) -> Vector3<f32> {
        let forward = self.target - self.position;
        let right = forward.cross(&self.up);
        if right.norm() < 1e-6 {
            Vector3::x()
        } else {
            right.normalize()
        }
    }

    /// Project a model-space point to pixel coordinates plus NDC depth.
    ///
    /// Returns `None` for points behind the camera or outside the frustum.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.view_projection() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

/// Width over height. Zero dimensions count as one pixel so the projection
/// never sees a zero or infinite aspect.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_from_config() {
        let camera = Camera::from_config(&ViewerConfig::default(), 800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_projection_refresh() {
        let mut camera = Camera::new(75.0, 1.0, 0.1, 1000.0);
        let before = *camera.projection_matrix();
        camera.aspect = 2.0;
        assert_eq!(*camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert!((camera.projection_matrix() - before).norm() > 1e-3);
    }

    #[test]
    fn test_zero_height_aspect() {
        assert_eq!(aspect_ratio(640, 0), 640.0);
    }

    #[test]
    fn test_zero_width_aspect() {
        assert_eq!(aspect_ratio(0, 600), 1.0 / 600.0);
        assert_eq!(aspect_ratio(0, 0), 1.0);
    }

    #[test]
    fn test_project_origin_to_center() {
        let mut camera = Camera::new(75.0, 1.0, 0.1, 1000.0);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 100, 100)
            .unwrap();
        assert!((x - 50.0).abs() < 1e-3);
        assert!((y - 50.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let mut camera = Camera::new(75.0, 1.0, 0.1, 1000.0);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 100, 100)
            .is_none());
    }
}
