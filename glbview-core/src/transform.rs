/// Model transforms: Euler rotation and scale
use nalgebra::{Matrix4, Rotation3, Vector3};

/// Rotation around the three axes in radians, applied in X, Y, Z order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.x);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), self.y);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), self.z);
        (rx * ry * rz).to_homogeneous()
    }
}

impl Default for EulerRotation {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Vector3<f32>> for EulerRotation {
    fn from(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Scale then rotate, matching how a scene node composes its local matrix
pub fn model_matrix(scale: &Vector3<f32>, rotation: &EulerRotation) -> Matrix4<f32> {
    rotation.matrix() * Matrix4::new_nonuniform_scaling(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_identity_rotation() {
        let matrix = EulerRotation::zero().matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_model_matrix_scales_before_rotating() {
        let rotation = EulerRotation::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let matrix = model_matrix(&Vector3::new(2.0, 2.0, 2.0), &rotation);
        let p = matrix.transform_point(&Point3::new(0.0, 1.0, 0.0));
        // +Y scaled to 2 then rotated a quarter turn about X lands on +Z
        assert!(p.x.abs() < 1e-5);
        assert!(p.y.abs() < 1e-5);
        assert!((p.z - 2.0).abs() < 1e-5);
    }
}
