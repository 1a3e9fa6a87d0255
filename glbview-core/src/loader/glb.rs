/// Binary glTF decoding into a flattened [`Model`]
use gltf::mesh::Mode;
use log::{debug, warn};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{Mesh, Model, Triangle, Vertex};

/// Decode a self-contained `.glb` (or embedded-buffer `.gltf`) scene.
///
/// Node transforms are baked into the vertices so the result is a single
/// model-space fragment. Textures are not sampled; each primitive keeps its
/// material's base color factor.
pub fn parse_glb(data: &[u8]) -> ViewerResult<Model> {
    let (document, buffers, _images) = gltf::import_slice(data)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    let mut model = Model::default();
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, &Matrix4::identity(), &buffers, &mut model)?;
            }
        }
        None => {
            // Scene-less files still carry meshes worth showing
            for mesh in document.meshes() {
                append_mesh(&mesh, &Matrix4::identity(), &buffers, &mut model)?;
            }
        }
    }

    if model.is_empty() {
        return Err(ViewerError::EmptyAsset);
    }
    Ok(model)
}

fn visit_node(
    node: &gltf::Node,
    parent: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    model: &mut Model,
) -> ViewerResult<()> {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        append_mesh(&mesh, &world, buffers, model)?;
    }
    for child in node.children() {
        visit_node(&child, &world, buffers, model)?;
    }
    Ok(())
}

fn append_mesh(
    mesh: &gltf::Mesh,
    world: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    model: &mut Model,
) -> ViewerResult<()> {
    let normal_matrix = normal_matrix(world);

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            let err = ViewerError::UnsupportedPrimitive(format!(
                "{:?} in mesh {}",
                primitive.mode(),
                mesh.name().unwrap_or("<unnamed>")
            ));
            warn!("Skipping primitive: {}", err);
            continue;
        }

        let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

        let positions: Vec<Point3<f32>> = match reader.read_positions() {
            Some(iter) => iter
                .map(|p| world.transform_point(&Point3::from(p)))
                .collect(),
            None => continue,
        };
        let normals: Option<Vec<Vector3<f32>>> = reader.read_normals().map(|iter| {
            iter.map(|n| {
                (normal_matrix * Vector3::from(n))
                    .try_normalize(1e-12)
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect()
        });
        let indices: Vec<u32> = match reader.read_indices() {
            Some(read) => read.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let mut out = Mesh::with_capacity(indices.len() / 3);
        out.base_color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();

        for face in indices.chunks_exact(3) {
            let corners = [face[0] as usize, face[1] as usize, face[2] as usize];
            if corners.iter().any(|&i| i >= positions.len()) {
                warn!("Index out of range in mesh {}", mesh.index());
                continue;
            }
            let mut triangle = Triangle::new(
                Vertex::new(positions[corners[0]], Vector3::zeros()),
                Vertex::new(positions[corners[1]], Vector3::zeros()),
                Vertex::new(positions[corners[2]], Vector3::zeros()),
            );
            let flat = triangle.face_normal();
            for (vertex, &i) in triangle.vertices.iter_mut().zip(corners.iter()) {
                vertex.normal = normals
                    .as_ref()
                    .and_then(|n| n.get(i).copied())
                    .unwrap_or(flat);
            }
            out.add_triangle(triangle);
        }

        debug!(
            "Primitive {} of mesh {}: {} triangles",
            primitive.index(),
            mesh.index(),
            out.triangles.len()
        );
        model.meshes.push(out);
    }
    Ok(())
}

/// Inverse-transpose of the upper 3x3, falling back to the plain linear part
fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = world.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}
