/// glbview core - host-independent model viewer session
///
/// Camera, orbit rig, camera transitions, scene root and asset decoding.
/// Browser and terminal hosts drive a [`Viewer`] through its event methods
/// and a [`RenderBackend`] of their own.

pub mod config;
pub mod error;
pub mod fullscreen;
pub mod geometry;
pub mod loader;
pub mod orbit;
pub mod projection;
pub mod scene;
pub mod transform;
pub mod tween;
pub mod viewer;

// Re-export commonly used types
pub use config::{Color, ViewerConfig};
pub use error::{ViewerError, ViewerResult};
pub use geometry::{Mesh, Model, Triangle, Vertex};
pub use loader::load_model;
pub use orbit::{DragMode, OrbitRig};
pub use projection::Camera;
pub use scene::{AmbientLight, ModelNode, Scene, Surface};
pub use transform::EulerRotation;
pub use viewer::{boot, Host, RenderBackend, Viewer, DIAGNOSTIC_MESSAGE};
