//! Shared types and utilities for the vigil scene.

mod color;
mod config;

pub use color::Rgb;
pub use config::{ConfigError, load_json_or_default};
