//! Procedural fire for the memorial scene.
//!
//! Two styles are supported:
//! - **point**: a ring of billboard samples generated once on the host and
//!   animated entirely in the vertex/fragment stages;
//! - **shell**: an open cone whose fragment stage evaluates value noise over
//!   its UVs.
//!
//! [`noise`] and [`shading`] are CPU mirrors of the WGSL used on the GPU. They
//! exist so the visual contract (noise determinism, colour/alpha synchrony,
//! sprite sizing) can be checked without a device.
//!
//! # Invariants
//! - Sample count and instance data never change after generation.
//! - Per-frame work is the time uniform only; there is no host-side jitter.
//! - Alpha and colour intensity come from the same noise sample.

pub mod emitter;
pub mod noise;
pub mod shading;
mod system;

pub use emitter::{EmitterConfig, EmitterError, FireEmitter, FireSample};
pub use shading::{FirePalette, Fragment, ShellParams};
pub use system::{
    FireError, FireGeometry, FirePlan, FireSettings, FireStyle, FireSystem, SPRITE_VERTICES,
};
