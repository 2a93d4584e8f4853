//! Sample-level building blocks of the ambient soundscape.
//!
//! Everything here is driven by a sample counter, never by wall-clock time,
//! so output is identical no matter how the audio thread is scheduled.

use rand::Rng;
use std::f32::consts::TAU;

/// Second-order IIR section in transposed direct form II.
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// RBJ cookbook low-pass at `cutoff` Hz with quality `q`.
    pub fn low_pass(cutoff: f32, q: f32, sample_rate: u32) -> Self {
        let w0 = TAU * cutoff / sample_rate as f32;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos) / a0;
        Self {
            b0: b1 / 2.0,
            b1,
            b2: b1 / 2.0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Gain at 0 Hz.
    pub fn dc_gain(&self) -> f32 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

pub const WIND_SECONDS: u32 = 2;
pub const WIND_AMPLITUDE: f32 = 0.4;
pub const WIND_CUTOFF_HZ: f32 = 260.0;
pub const WIND_Q: f32 = 0.7;
pub const WIND_GAIN: f32 = 0.2;

/// Looped white-noise buffer through a low-pass filter.
#[derive(Debug, Clone)]
pub struct WindBed {
    buffer: Vec<f32>,
    cursor: usize,
    filter: Biquad,
}

impl WindBed {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, sample_rate: u32) -> Self {
        let len = (sample_rate * WIND_SECONDS).max(1) as usize;
        let buffer = (0..len)
            .map(|_| (rng.r#gen::<f32>() * 2.0 - 1.0) * WIND_AMPLITUDE)
            .collect();
        Self {
            buffer,
            cursor: 0,
            filter: Biquad::low_pass(WIND_CUTOFF_HZ, WIND_Q, sample_rate),
        }
    }

    pub fn loop_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn next_sample(&mut self) -> f32 {
        let raw = self.buffer[self.cursor];
        self.cursor = (self.cursor + 1) % self.buffer.len();
        self.filter.process(raw) * WIND_GAIN
    }
}

/// Gain curve of one resonant tone.
///
/// Linear rise to `peak` over `attack`, exponential fall to `floor` at
/// `decay_end`, then held until the voice stops at `stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub peak: f32,
    pub floor: f32,
    pub attack: f32,
    pub decay_end: f32,
    pub stop: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            peak: 0.08,
            floor: 0.0001,
            attack: 0.02,
            decay_end: 2.0,
            stop: 2.1,
        }
    }
}

impl Envelope {
    /// Gain at `t` seconds after the voice started, `None` once it has stopped.
    pub fn gain(&self, t: f32) -> Option<f32> {
        if t >= self.stop {
            return None;
        }
        let gain = if t < self.attack {
            self.peak * t / self.attack
        } else if t < self.decay_end {
            let progress = (t - self.attack) / (self.decay_end - self.attack);
            self.peak * (self.floor / self.peak).powf(progress)
        } else {
            self.floor
        };
        Some(gain)
    }
}

pub const TONE_MIN_HZ: f32 = 240.0;
pub const TONE_SPREAD_HZ: f32 = 180.0;

/// Sine tone shaped by an [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceVoice {
    frequency: f32,
    envelope: Envelope,
    sample_rate: u32,
    position: u64,
}

impl ResonanceVoice {
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            envelope: Envelope::default(),
            sample_rate,
            position: 0,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R, sample_rate: u32) -> Self {
        Self::new(TONE_MIN_HZ + rng.r#gen::<f32>() * TONE_SPREAD_HZ, sample_rate)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Next sample, or `None` once the voice has finished.
    pub fn next_sample(&mut self) -> Option<f32> {
        let t = self.position as f32 / self.sample_rate as f32;
        let gain = self.envelope.gain(t)?;
        // Wrap the phase per cycle so long voices keep f32 precision.
        let phase = (self.position as f64 * self.frequency as f64 / self.sample_rate as f64).fract();
        self.position += 1;
        Some((TAU * phase as f32).sin() * gain)
    }
}

pub const INTERVAL_MIN_SECONDS: f32 = 6.0;
pub const INTERVAL_SPREAD_SECONDS: f32 = 8.0;

/// Decides on which samples a new tone starts.
///
/// The first tone fires on sample 0; each later one follows the previous by
/// `6 + r * 8` seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneScheduler {
    sample_rate: u32,
    next_at: u64,
}

impl ToneScheduler {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            next_at: 0,
        }
    }

    pub fn next_at(&self) -> u64 {
        self.next_at
    }

    /// Whether a tone starts at sample `now`.
    pub fn poll<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R) -> bool {
        if now < self.next_at {
            return false;
        }
        let delay = INTERVAL_MIN_SECONDS + rng.r#gen::<f32>() * INTERVAL_SPREAD_SECONDS;
        self.next_at = now + (delay * self.sample_rate as f32) as u64;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const RATE: u32 = 44_100;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn sine_through(filter: &mut Biquad, hz: f32) -> f32 {
        let out: Vec<f32> = (0..RATE)
            .map(|n| filter.process((TAU * hz * n as f32 / RATE as f32).sin()))
            .collect();
        // Skip the transient.
        rms(&out[RATE as usize / 2..])
    }

    #[test]
    fn low_pass_has_unity_dc_gain() {
        let filter = Biquad::low_pass(WIND_CUTOFF_HZ, WIND_Q, RATE);
        assert!((filter.dc_gain() - 1.0).abs() < 1e-2);
    }

    #[test]
    fn low_pass_attenuates_above_cutoff() {
        let low = sine_through(&mut Biquad::low_pass(260.0, 0.7, RATE), 60.0);
        let high = sine_through(&mut Biquad::low_pass(260.0, 0.7, RATE), 4_000.0);
        assert!(low > 0.6, "passband rms {low}");
        assert!(high < 0.01, "stopband rms {high}");
    }

    #[test]
    fn wind_loops_two_seconds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut wind = WindBed::new(&mut rng, RATE);
        assert_eq!(wind.loop_len(), 2 * RATE as usize);
        let out: Vec<f32> = (0..RATE).map(|_| wind.next_sample()).collect();
        assert!(out.iter().all(|s| s.abs() < WIND_AMPLITUDE * WIND_GAIN * 2.0));
        assert!(rms(&out) > 1e-3);
    }

    #[test]
    fn envelope_shape() {
        let env = Envelope::default();
        assert_eq!(env.gain(0.0), Some(0.0));
        assert!((env.gain(0.01).unwrap() - 0.04).abs() < 1e-6);
        assert!((env.gain(0.02).unwrap() - 0.08).abs() < 1e-6);
        assert!((env.gain(1.99).unwrap() - 0.0001).abs() < 1e-4);
        assert_eq!(env.gain(2.05), Some(0.0001));
        assert_eq!(env.gain(2.1), None);

        // Strictly decaying after the attack.
        let mut prev = env.gain(0.02).unwrap();
        for i in 1..100 {
            let g = env.gain(0.02 + i as f32 * 0.0198).unwrap();
            assert!(g < prev);
            prev = g;
        }
    }

    #[test]
    fn voice_ends_after_stop_time() {
        let mut voice = ResonanceVoice::new(300.0, RATE);
        let mut count = 0u32;
        let mut peak = 0.0f32;
        while let Some(s) = voice.next_sample() {
            peak = peak.max(s.abs());
            count += 1;
        }
        assert_eq!(count, 92_610);
        assert!(peak <= 0.08 + 1e-6 && peak > 0.07);
        assert!(voice.next_sample().is_none());
    }

    #[test]
    fn random_voice_frequency_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let f = ResonanceVoice::random(&mut rng, RATE).frequency();
            assert!((TONE_MIN_HZ..TONE_MIN_HZ + TONE_SPREAD_HZ).contains(&f));
        }
    }

    #[test]
    fn scheduler_fires_immediately_then_every_six_to_fourteen_seconds() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut scheduler = ToneScheduler::new(RATE);
        let mut fired = Vec::new();
        for now in 0..(120 * RATE as u64) {
            if scheduler.poll(now, &mut rng) {
                fired.push(now);
            }
        }
        assert_eq!(fired[0], 0);
        assert!(fired.len() >= 120 / 14);
        for pair in fired.windows(2) {
            let gap = (pair[1] - pair[0]) as f32 / RATE as f32;
            assert!((6.0..14.0 + 1e-3).contains(&gap), "gap {gap}");
        }
    }
}
