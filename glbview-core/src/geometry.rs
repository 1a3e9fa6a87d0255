/// Geometry primitives for a loaded model
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order; zero for degenerate faces
    pub fn face_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Average of the vertex normals, or the face normal when they cancel out
    pub fn shading_normal(&self) -> Vector3<f32> {
        let sum = self.vertices.iter().fold(Vector3::zeros(), |acc, v| acc + v.normal);
        sum.try_normalize(1e-12).unwrap_or_else(|| self.face_normal())
    }
}

/// Triangles sharing one base color
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    /// Linear RGBA
    pub base_color: [f32; 4],
}

impl Mesh {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
            base_color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded asset: every mesh of the scene flattened into model space
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Point3::new(x, y, z), Vector3::z())
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let tri = Triangle::new(vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0));
        assert!((tri.face_normal() - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_face_normal() {
        let tri = Triangle::new(vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(2.0, 0.0, 0.0));
        assert_eq!(tri.face_normal(), Vector3::zeros());
    }

    #[test]
    fn test_shading_normal_prefers_vertex_normals() {
        let tilted = Vector3::new(1.0, 0.0, 1.0).normalize();
        let v = |x: f32, y: f32| Vertex::new(Point3::new(x, y, 0.0), tilted);
        let tri = Triangle::new(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0));
        assert!((tri.shading_normal() - tilted).norm() < 1e-6);

        let flat = |x: f32, y: f32| Vertex::new(Point3::new(x, y, 0.0), Vector3::zeros());
        let tri = Triangle::new(flat(0.0, 0.0), flat(1.0, 0.0), flat(0.0, 1.0));
        assert!((tri.shading_normal() - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_model_triangle_count() {
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::new(vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)));
        let model = Model {
            meshes: vec![mesh.clone(), mesh, Mesh::new()],
        };
        assert_eq!(model.triangle_count(), 2);
        assert!(Model::default().is_empty());
    }
}
