//! Ambient soundscape for the memorial scene.
//!
//! A low-passed wind bed plays continuously; a soft sine tone with a short
//! attack and a two-second exponential tail starts immediately and then every
//! six to fourteen seconds. All of it is synthesised sample by sample inside
//! [`AmbientSource`], which `rodio` pulls from its output thread.
//!
//! Playback is gated behind a user gesture ([`AudioGate`]). A missing or
//! broken output device is reported and otherwise ignored.

mod gate;
mod source;
pub mod synth;

use serde::{Deserialize, Serialize};

pub use gate::{AudioBackend, AudioGate, GateState, RodioBackend};
pub use source::AmbientSource;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("audio device: {0}")]
    Device(String),
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error("invalid master gain {0}")]
    InvalidGain(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Never open the output device.
    pub muted: bool,
    pub master_gain: f32,
    pub sample_rate: u32,
    /// Seed for the noise buffer and tone timing. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: false,
            master_gain: 0.12,
            sample_rate: 44_100,
            seed: None,
        }
    }
}

impl AudioSettings {
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(self.sample_rate));
        }
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(AudioError::InvalidGain(self.master_gain));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_and_partial_json() {
        let settings: AudioSettings = serde_json::from_str(r#"{ "muted": true }"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.master_gain, 0.12);
        assert_eq!(settings.sample_rate, 44_100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_bad_settings() {
        let zero_rate = AudioSettings {
            sample_rate: 0,
            ..AudioSettings::default()
        };
        assert_eq!(zero_rate.validate(), Err(AudioError::InvalidSampleRate(0)));
        let loud = AudioSettings {
            master_gain: f32::INFINITY,
            ..AudioSettings::default()
        };
        assert!(loud.validate().is_err());
    }
}
