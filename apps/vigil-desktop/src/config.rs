use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigil_audio::AudioSettings;
use vigil_common::{ConfigError, load_json_or_default};
use vigil_fire::{FireSettings, FireStyle};

/// Everything the desktop host can be configured with from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub fire: FireSettings,
    pub audio: AudioSettings,
}

/// Command-line flags that take precedence over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Seed for fire sample generation and audio timing
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fire style: point or shell
    #[arg(long, value_name = "STYLE")]
    pub fire: Option<FireStyle>,

    /// Fire animation speed multiplier
    #[arg(long)]
    pub speed: Option<f32>,

    /// Never start audio
    #[arg(long)]
    pub mute: bool,
}

impl VigilConfig {
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config: VigilConfig = load_json_or_default(path)?;
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(seed) = overrides.seed {
            self.fire.seed = Some(seed);
            self.audio.seed = Some(seed);
        }
        if let Some(style) = overrides.fire {
            self.fire.style = style;
        }
        if let Some(speed) = overrides.speed {
            self.fire.speed = Some(speed);
        }
        if overrides.mute {
            self.audio.muted = true;
        }
    }
}
