//! CPU reference of the fire vertex and fragment stages.
//!
//! Each function matches a block of WGSL in the renderer's fire shaders; keep
//! both sides in step when tuning constants.

use crate::emitter::FireSample;
use crate::noise;
use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use vigil_common::Rgb;

/// Pixel size of a sprite with `size == 1` at view depth 1.
pub const POINT_SCALE: f32 = 280.0;
/// Vertical flicker: `sin(time * JITTER_RATE + seed * JITTER_PHASE) * JITTER_AMPLITUDE`.
pub const JITTER_RATE: f32 = 1.4;
pub const JITTER_PHASE: f32 = 6.0;
pub const JITTER_AMPLITUDE: f32 = 0.02;

/// GLSL/WGSL `smoothstep` for `edge0 < edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Colours of the point-sprite flame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirePalette {
    pub core: Rgb,
    pub tip: Rgb,
    /// Output gain applied after intensity modulation.
    pub gain: f32,
}

impl Default for FirePalette {
    fn default() -> Self {
        Self {
            core: Rgb::new(1.0, 0.45, 0.08),
            tip: Rgb::new(1.0, 0.88, 0.45),
            gain: 1.35,
        }
    }
}

/// Uniform parameters of the shell (cone) flame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellParams {
    /// Brightest colour, reached toward the top.
    pub color1: Rgb,
    pub color2: Rgb,
    /// Darkest colour, at the base.
    pub color3: Rgb,
    pub noise_scale: f32,
    pub distortion: f32,
}

impl Default for ShellParams {
    fn default() -> Self {
        Self {
            color1: Rgb::new(1.0, 0.82, 0.45),
            color2: Rgb::new(1.0, 0.45, 0.1),
            color3: Rgb::new(0.25, 0.05, 0.02),
            noise_scale: 1.8,
            distortion: 0.25,
        }
    }
}

/// One shaded fire fragment.
///
/// `alpha` equals `intensity`, so colour and alpha flicker together. Point
/// sprites also modulate `color` by `intensity`; the shell leaves it as the
/// raw ramp colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Noise sample mapped into `[0, 1]`.
    pub noise: f32,
    pub intensity: f32,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Sample position after the in-shader vertical flicker.
pub fn jittered_position(sample: &FireSample, time: f32) -> Vec3 {
    let mut p = Vec3::from_array(sample.position);
    p.y += (time * JITTER_RATE + sample.seed * JITTER_PHASE).sin() * JITTER_AMPLITUDE;
    p
}

/// On-screen sprite size in pixels for a view-space Z.
///
/// Depth is clamped to 1 so sprites right in front of the camera do not balloon.
pub fn sprite_size(size: f32, view_z: f32) -> f32 {
    size * (POINT_SCALE / (-view_z).max(1.0))
}

/// Clip-space centre and pixel size of one sample's sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteVertex {
    pub world_position: Vec3,
    pub clip_center: Vec4,
    pub size_px: f32,
}

impl SpriteVertex {
    /// Clip-space position of a quad corner, `corner` in `[0, 1]^2`.
    pub fn corner(&self, corner: Vec2, viewport: Vec2) -> Vec4 {
        let offset = (corner * 2.0 - Vec2::ONE) * self.size_px / viewport;
        let c = self.clip_center;
        Vec4::new(c.x + offset.x * c.w, c.y + offset.y * c.w, c.z, c.w)
    }
}

pub fn project_sample(
    sample: &FireSample,
    time: f32,
    view: &Mat4,
    projection: &Mat4,
) -> SpriteVertex {
    let world_position = jittered_position(sample, time);
    let view_pos = *view * world_position.extend(1.0);
    SpriteVertex {
        world_position,
        clip_center: *projection * view_pos,
        size_px: sprite_size(sample.size, view_pos.z),
    }
}

/// Point-sprite fragment at `sprite_coord` (`[0, 1]^2`, centre at 0.5).
pub fn point_fragment(
    palette: &FirePalette,
    world_position: Vec3,
    seed: f32,
    sprite_coord: Vec2,
    time: f32,
) -> Fragment {
    let dist = sprite_coord.distance(Vec2::splat(0.5));
    let base = 1.0 - smoothstep(0.1, 0.52, dist);
    let n = noise::simplex3_unit(Vec3::new(
        world_position.x * 2.2,
        world_position.y * 3.2 + time * 0.8,
        world_position.z * 2.2 + seed,
    ));
    let flicker = 0.65 + 0.35 * n;
    let height_glow = (world_position.y * 2.6).clamp(0.0, 1.0);
    let intensity = base * flicker * (0.6 + height_glow);

    let color = Vec3::from(palette.core.lerp(palette.tip, height_glow)) * intensity * palette.gain;
    Fragment {
        noise: n,
        intensity,
        color: color.to_array(),
        alpha: intensity,
    }
}

/// Shell fragment at mesh UV `uv` (`v` is normalised height).
pub fn shell_fragment(params: &ShellParams, uv: Vec2, time: f32) -> Fragment {
    let height = uv.y.clamp(0.0, 1.0);
    let swirl = Vec2::new(uv.x * 3.0, uv.y * 4.0 + time * 1.8);
    let n = noise::value2(swirl * params.noise_scale + Vec2::new(time * 0.4, -time * 0.7));
    let flicker = smoothstep(0.2, 1.0, n + height * 0.4);
    let shape = smoothstep(0.0, 0.6, height) * (1.0 - smoothstep(0.75, 1.0, height));
    let edge = 1.0 - smoothstep(0.4, 0.8, (uv.x - 0.5).abs() + n * params.distortion);

    let base = params.color3.lerp(params.color2, height);
    let base = base.lerp(params.color1, height.powf(1.4));
    let intensity = flicker * shape * edge;
    Fragment {
        noise: n,
        intensity,
        color: base.0,
        alpha: intensity,
    }
}
