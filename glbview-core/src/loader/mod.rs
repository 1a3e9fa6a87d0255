/// Asset decoding. Hosts fetch the bytes, this module turns them into a [`Model`].
use log::info;

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::Model;

pub mod glb;
pub mod stl;

/// Container formats recognised by [`load_model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    /// Binary glTF container
    Glb,
    /// JSON glTF with embedded buffers
    Gltf,
    Stl,
}

impl AssetFormat {
    /// Sniff the format from the leading bytes
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(b"glTF") {
            return AssetFormat::Glb;
        }
        match data.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => AssetFormat::Gltf,
            _ => AssetFormat::Stl,
        }
    }
}

/// Decode an asset of any supported format
pub fn load_model(data: &[u8]) -> ViewerResult<Model> {
    let format = AssetFormat::detect(data);
    let model = match format {
        AssetFormat::Glb | AssetFormat::Gltf => glb::parse_glb(data)?,
        AssetFormat::Stl => {
            let mesh = stl::parse_stl(data)?;
            if mesh.triangles.is_empty() {
                return Err(ViewerError::EmptyAsset);
            }
            Model { meshes: vec![mesh] }
        }
    };

    info!(
        "Decoded {:?} asset: {} meshes, {} triangles",
        format,
        model.meshes.len(),
        model.triangle_count()
    );
    Ok(model)
}
