//! wgpu render backend for the memorial scene.
//!
//! One opaque pass draws the static renderables with Blinn-Phong shading, a
//! flickering fire light and linear fog. The fire follows in the same pass
//! with additive blending and depth testing against the opaque geometry.
//!
//! # Invariants
//! - Every WGSL program is validated with naga, and every uniform and vertex
//!   input the host binds is found by name, before any pipeline is created.
//! - The renderer never mutates scene or fire state.
//! - Per frame only uniform buffers are written; meshes and fire samples are
//!   uploaded once.

mod context;
mod error;
mod reflect;
mod renderer;
pub mod shaders;
mod uniforms;

pub use context::RenderContext;
pub use error::SetupError;
pub use reflect::{ProgramLayout, UniformSlot};
pub use renderer::{RenderStats, WgpuRenderer};
pub use uniforms::{FirePointUniforms, FireShellUniforms, FrameUniforms, ObjectUniforms};
