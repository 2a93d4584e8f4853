use crate::synth::{ResonanceVoice, ToneScheduler, WindBed};
use crate::{AudioError, AudioSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rodio::{ChannelCount, SampleRate, Source};
use std::time::Duration;

/// Endless mono mix of the wind bed and scheduled resonant tones.
///
/// Runs on the audio output thread; nothing here touches the render loop.
#[derive(Debug, Clone)]
pub struct AmbientSource<R = StdRng> {
    rng: R,
    sample_rate: u32,
    master_gain: f32,
    wind: WindBed,
    scheduler: ToneScheduler,
    voices: Vec<ResonanceVoice>,
    position: u64,
    tones_started: u64,
}

impl AmbientSource<StdRng> {
    pub fn new(settings: &AudioSettings) -> Result<Self, AudioError> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(settings, rng)
    }
}

impl<R: Rng> AmbientSource<R> {
    pub fn with_rng(settings: &AudioSettings, mut rng: R) -> Result<Self, AudioError> {
        settings.validate()?;
        let wind = WindBed::new(&mut rng, settings.sample_rate);
        Ok(Self {
            rng,
            sample_rate: settings.sample_rate,
            master_gain: settings.master_gain,
            wind,
            scheduler: ToneScheduler::new(settings.sample_rate),
            voices: Vec::new(),
            position: 0,
            tones_started: 0,
        })
    }

    /// Samples produced so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn tones_started(&self) -> u64 {
        self.tones_started
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn next_sample(&mut self) -> f32 {
        if self.scheduler.poll(self.position, &mut self.rng) {
            let voice = ResonanceVoice::random(&mut self.rng, self.sample_rate);
            tracing::trace!(frequency = voice.frequency(), "resonance tone");
            self.voices.push(voice);
            self.tones_started += 1;
        }

        let mut mix = self.wind.next_sample();
        self.voices.retain_mut(|voice| match voice.next_sample() {
            Some(s) => {
                mix += s;
                true
            }
            None => false,
        });
        self.position += 1;
        mix * self.master_gain
    }
}

impl<R: Rng> Iterator for AmbientSource<R> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        Some(self.next_sample())
    }
}

impl<R: Rng> Source for AmbientSource<R> {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> ChannelCount {
        1
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> AmbientSource {
        AmbientSource::new(&AudioSettings {
            seed: Some(seed),
            ..AudioSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn first_tone_starts_immediately() {
        let mut source = seeded(1);
        source.next();
        assert_eq!(source.tones_started(), 1);
        assert_eq!(source.active_voices(), 1);
    }

    #[test]
    fn voices_are_released() {
        let mut source = seeded(2);
        // Past the first tone's stop time, but before the earliest second tone.
        for _ in 0..(3 * 44_100) {
            source.next();
        }
        assert_eq!(source.tones_started(), 1);
        assert_eq!(source.active_voices(), 0);
    }

    #[test]
    fn output_is_quiet_and_alive() {
        let mut source = seeded(3);
        let block: Vec<f32> = source.by_ref().take(44_100).collect();
        let peak = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        // Master 0.12 over wind (at most ~0.1 after the filter) plus a 0.08 tone.
        assert!(peak < 0.12 * 0.2, "peak {peak}");
        assert!(peak > 1e-3);
        assert_eq!(source.position(), 44_100);
    }

    #[test]
    fn seeded_output_is_reproducible() {
        let a: Vec<f32> = seeded(9).take(4_096).collect();
        let b: Vec<f32> = seeded(9).take(4_096).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn stream_shape() {
        let source = seeded(4);
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 44_100);
        assert!(source.total_duration().is_none());
    }
}
