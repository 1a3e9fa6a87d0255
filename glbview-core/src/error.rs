/// Error types for the viewer session and asset decoding
use thiserror::Error;

/// Result type for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors surfaced by the viewer and its hosts
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Render backend unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Failed to fetch asset: {0}")]
    Fetch(String),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("STL error: {0}")]
    Stl(String),

    #[error("Asset contains no triangles")]
    EmptyAsset,

    #[error("Unsupported primitive: {0}")]
    UnsupportedPrimitive(String),

    #[error("Render backend error: {0}")]
    Backend(String),
}
