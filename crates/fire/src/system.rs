use crate::emitter::{EmitterConfig, EmitterError, FireEmitter, FireSample};
use crate::shading::{FirePalette, ShellParams};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vigil_scene::mesh::{self, Mesh, MeshError};
use vigil_scene::ModelTransform;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FireError {
    #[error(transparent)]
    Emitter(#[from] EmitterError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error("fire speed must be finite and non-negative, got {0}")]
    InvalidSpeed(f32),
}

/// Which fire geometry to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FireStyle {
    #[default]
    Point,
    Shell,
}

impl FireStyle {
    /// Animation speed used when none is configured.
    pub fn default_speed(self) -> f32 {
        match self {
            FireStyle::Point => 1.0,
            FireStyle::Shell => 0.56,
        }
    }
}

impl fmt::Display for FireStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FireStyle::Point => "point",
            FireStyle::Shell => "shell",
        })
    }
}

impl FromStr for FireStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" | "points" => Ok(FireStyle::Point),
            "shell" | "cone" => Ok(FireStyle::Shell),
            other => Err(format!("unknown fire style `{other}` (expected point or shell)")),
        }
    }
}

/// User-facing fire configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireSettings {
    pub style: FireStyle,
    /// Multiplier from elapsed seconds to shader time. `None` picks the
    /// style's default.
    pub speed: Option<f32>,
    /// Seed for sample generation. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub emitter: EmitterConfig,
    pub palette: FirePalette,
    pub shell: ShellParams,
}

impl FireSettings {
    pub fn speed(&self) -> f32 {
        self.speed.unwrap_or_else(|| self.style.default_speed())
    }
}

/// Fire geometry, built once.
#[derive(Debug, Clone)]
pub enum FireGeometry {
    Points(FireEmitter),
    Shell { mesh: Mesh, transform: ModelTransform },
}

/// What the renderer has to do for the fire this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirePlan {
    pub style: FireStyle,
    /// Value for the shader's time uniform.
    pub time: f32,
    pub instance_count: u32,
    /// Vertices (point sprites) or indices (shell) per instance.
    pub element_count: u32,
    /// Size of the instance buffer; uploaded once at setup.
    pub instance_bytes: u64,
    pub draw_calls: u32,
}

/// Vertices in one point-sprite quad, drawn as a triangle strip.
pub const SPRITE_VERTICES: u32 = 4;

#[derive(Debug, Clone)]
pub struct FireSystem {
    settings: FireSettings,
    geometry: FireGeometry,
}

impl FireSystem {
    /// Build with the configured seed, or an OS-seeded generator.
    pub fn new(settings: FireSettings) -> Result<Self, FireError> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(settings, &mut rng)
    }

    pub fn with_rng<R: Rng + ?Sized>(settings: FireSettings, rng: &mut R) -> Result<Self, FireError> {
        let speed = settings.speed();
        if !speed.is_finite() || speed < 0.0 {
            return Err(FireError::InvalidSpeed(speed));
        }
        let geometry = match settings.style {
            FireStyle::Point => FireGeometry::Points(FireEmitter::generate(&settings.emitter, rng)?),
            FireStyle::Shell => FireGeometry::Shell {
                mesh: mesh::open_cylinder(0.4, 0.65, 1.6, 32)?,
                transform: ModelTransform::at(0.0, 0.6, 0.0),
            },
        };
        tracing::info!(style = %settings.style, speed, "fire system ready");
        Ok(Self { settings, geometry })
    }

    pub fn settings(&self) -> &FireSettings {
        &self.settings
    }

    pub fn style(&self) -> FireStyle {
        self.settings.style
    }

    pub fn geometry(&self) -> &FireGeometry {
        &self.geometry
    }

    /// Point samples, empty for the shell style.
    pub fn samples(&self) -> &[FireSample] {
        match &self.geometry {
            FireGeometry::Points(emitter) => emitter.samples(),
            FireGeometry::Shell { .. } => &[],
        }
    }

    /// World-space centre of the fire.
    pub fn origin(&self) -> Vec3 {
        match &self.geometry {
            FireGeometry::Points(_) => Vec3::ZERO,
            FireGeometry::Shell { transform, .. } => transform.translation,
        }
    }

    /// Per-frame plan. Only `time` depends on `elapsed`.
    pub fn plan(&self, elapsed: f32) -> FirePlan {
        let (instance_count, element_count, instance_bytes) = match &self.geometry {
            FireGeometry::Points(emitter) => (
                emitter.len() as u32,
                SPRITE_VERTICES,
                emitter.as_bytes().len() as u64,
            ),
            FireGeometry::Shell { mesh, .. } => (1, mesh.index_count(), 0),
        };
        FirePlan {
            style: self.settings.style,
            time: elapsed * self.settings.speed(),
            instance_count,
            element_count,
            instance_bytes,
            draw_calls: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(style: FireStyle) -> FireSystem {
        FireSystem::new(FireSettings {
            style,
            seed: Some(42),
            ..FireSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn plan_is_frame_rate_independent() {
        let fire = seeded(FireStyle::Point);
        // Two hosts at different frame rates reach the same elapsed time.
        let mut at_60 = None;
        for frame in 0..=120 {
            at_60 = Some(fire.plan(frame as f32 / 60.0));
        }
        let mut at_144 = None;
        for frame in 0..=288 {
            at_144 = Some(fire.plan(frame as f32 / 144.0));
        }
        let (a, b) = (at_60.unwrap(), at_144.unwrap());
        assert_eq!(a, b);
        assert!((a.time - 2.0).abs() < 1e-6);
    }

    #[test]
    fn only_time_varies() {
        let fire = seeded(FireStyle::Point);
        let a = fire.plan(1.0);
        let b = fire.plan(1.016);
        assert_ne!(a.time, b.time);
        assert_eq!(FirePlan { time: a.time, ..b }, a);
        assert_eq!(a.instance_count, 460);
        assert_eq!(a.element_count, SPRITE_VERTICES);
        assert_eq!(a.instance_bytes, 460 * FireSample::STRIDE as u64);
        assert_eq!(a.draw_calls, 1);
    }

    #[test]
    fn shell_style_uses_cone() {
        let fire = seeded(FireStyle::Shell);
        let plan = fire.plan(10.0);
        assert_eq!(plan.instance_count, 1);
        assert_eq!(plan.element_count, 32 * 6);
        assert!((plan.time - 5.6).abs() < 1e-5);
        assert!(fire.samples().is_empty());
        assert_eq!(fire.origin(), Vec3::new(0.0, 0.6, 0.0));
    }

    #[test]
    fn explicit_speed_overrides_default() {
        let fire = FireSystem::new(FireSettings {
            speed: Some(2.0),
            seed: Some(1),
            ..FireSettings::default()
        })
        .unwrap();
        assert_eq!(fire.plan(3.0).time, 6.0);

        let bad = FireSettings {
            speed: Some(f32::NAN),
            ..FireSettings::default()
        };
        assert!(matches!(FireSystem::new(bad), Err(FireError::InvalidSpeed(_))));
    }

    #[test]
    fn same_seed_same_samples() {
        assert_eq!(seeded(FireStyle::Point).samples(), seeded(FireStyle::Point).samples());
    }

    #[test]
    fn style_parses_and_deserializes() {
        assert_eq!("Shell".parse::<FireStyle>(), Ok(FireStyle::Shell));
        assert!("torch".parse::<FireStyle>().is_err());
        let settings: FireSettings = serde_json::from_str(r#"{ "style": "shell" }"#).unwrap();
        assert_eq!(settings.style, FireStyle::Shell);
        assert_eq!(settings.speed(), 0.56);
        assert_eq!(settings.emitter, EmitterConfig::default());
    }
}
