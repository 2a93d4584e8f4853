//! Renderer-agnostic description of the memorial scene.
//!
//! Everything here is plain data and pure functions: the camera and model
//! matrices, the procedural meshes, the fixed list of opaque renderables and
//! the frame clock that drives animation. GPU backends consume these values
//! and never feed anything back.
//!
//! # Invariants
//! - Meshes are built once; index buffers always fit in `u16`.
//! - Projection depends only on fov, aspect, near and far.
//! - Elapsed time is read fresh every frame, never accumulated from deltas.

mod camera;
mod frame;
pub mod mesh;
mod scene;
mod viewport;

pub use camera::{Camera, ModelTransform};
pub use frame::{DriverState, FrameClock, FrameDriver, FrameInput};
pub use mesh::{Mesh, MeshError};
pub use scene::{FireLight, Lighting, Material, MemorialScene, Renderable};
pub use viewport::{MAX_PIXEL_RATIO, Viewport};
