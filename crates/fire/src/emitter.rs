//! Ring-shaped emitter for the point-sprite fire.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::ops::Range;

/// One fire sample, laid out exactly as the GPU instance buffer expects.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FireSample {
    pub position: [f32; 3],
    /// Sprite size in pixels before depth attenuation.
    pub size: f32,
    /// Decorrelates per-sample noise phase; collisions are harmless.
    pub seed: f32,
}

impl FireSample {
    pub const STRIDE: usize = std::mem::size_of::<FireSample>();

    pub fn height(&self) -> f32 {
        self.position[1]
    }

    pub fn radius(&self) -> f32 {
        self.position[0].hypot(self.position[2])
    }
}

/// Errors from emitter configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitterError {
    #[error("emitter needs at least one sample")]
    Empty,
    #[error("invalid {name} range [{min}, {max})")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
}

/// Shape and value ranges of the emitter ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub count: u32,
    pub radius_min: f32,
    pub radius_max: f32,
    /// Full width of the uniform X/Z jitter applied after ring placement.
    pub planar_jitter: f32,
    pub height_min: f32,
    pub height_max: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub seed_max: f32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            count: 460,
            radius_min: 0.62,
            radius_max: 0.70,
            planar_jitter: 0.05,
            height_min: 0.06,
            height_max: 0.31,
            size_min: 18.0,
            size_max: 32.0,
            seed_max: 10.0,
        }
    }
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<(), EmitterError> {
        if self.count == 0 {
            return Err(EmitterError::Empty);
        }
        let ranges = [
            ("radius", self.radius_min, self.radius_max),
            ("planar_jitter", 0.0, self.planar_jitter),
            ("height", self.height_min, self.height_max),
            ("size", self.size_min, self.size_max),
            ("seed", 0.0, self.seed_max),
        ];
        for (name, min, max) in ranges {
            // Heights may dip below the ground plane; nothing else may be negative.
            let negative = min < 0.0 && name != "height";
            if !min.is_finite() || !max.is_finite() || min > max || negative {
                return Err(EmitterError::InvalidRange { name, min, max });
            }
        }
        Ok(())
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, range: Range<f32>) -> f32 {
    // `gen_range` panics on empty ranges; degenerate bands collapse to their start.
    if range.start < range.end {
        rng.gen_range(range)
    } else {
        range.start
    }
}

/// The fixed set of fire samples, generated once and never resized.
#[derive(Debug, Clone, PartialEq)]
pub struct FireEmitter {
    config: EmitterConfig,
    samples: Vec<FireSample>,
}

impl FireEmitter {
    /// Generate `config.count` samples evenly spaced by angle around the ring.
    ///
    /// Radius, jitter, height, size and seed are drawn from `rng`; pass a
    /// seeded generator for reproducible output.
    pub fn generate<R: Rng + ?Sized>(
        config: &EmitterConfig,
        rng: &mut R,
    ) -> Result<Self, EmitterError> {
        config.validate()?;
        let half_jitter = config.planar_jitter / 2.0;
        let samples = (0..config.count)
            .map(|i| {
                let angle = i as f32 / config.count as f32 * TAU;
                let radius = uniform(rng, config.radius_min..config.radius_max);
                let x = angle.cos() * radius + uniform(rng, -half_jitter..half_jitter);
                let y = uniform(rng, config.height_min..config.height_max);
                let z = angle.sin() * radius + uniform(rng, -half_jitter..half_jitter);
                FireSample {
                    position: [x, y, z],
                    size: uniform(rng, config.size_min..config.size_max),
                    seed: uniform(rng, 0.0..config.seed_max),
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = samples.len(), "fire emitter generated");
        Ok(Self {
            config: config.clone(),
            samples,
        })
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn samples(&self) -> &[FireSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw instance bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.samples)
    }
}
