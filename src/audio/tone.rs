//! Synthetic input for headless runs
//!
//! Produces interleaved stereo fragments the same shape a capture callback
//! delivers, so the downmix and locking paths get exercised without a device.

use std::f32::consts::TAU;

/// Sine tone with a slow amplitude swell
#[derive(Debug, Clone)]
pub struct ToneSource {
    freq: f32,
    sample_rate: f32,
    amplitude: f32,
    /// Samples per full swell cycle (0 = steady)
    swell_samples: u64,
    phase: f32,
    /// Samples produced so far
    count: u64,
}

impl ToneSource {
    pub fn new(freq: f32, sample_rate: u32) -> Self {
        Self {
            freq,
            sample_rate: sample_rate.max(1) as f32,
            amplitude: 0.5,
            swell_samples: 0,
            phase: 0.0,
            count: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    pub fn with_swell(mut self, period_secs: f32) -> Self {
        self.swell_samples = (period_secs.max(0.0) * self.sample_rate) as u64;
        self
    }

    /// Next `frames` stereo frames, interleaved L/R
    pub fn next_fragment(&mut self, frames: usize) -> Vec<f32> {
        let step = TAU * self.freq / self.sample_rate;
        let mut out = Vec::with_capacity(frames * 2);

        for _ in 0..frames {
            let s = self.phase.sin() * self.amplitude * self.swell();
            out.push(s);
            out.push(s);

            self.phase = (self.phase + step) % TAU;
            self.count += 1;
        }

        out
    }

    /// Envelope in [0, 1] at the current sample
    fn swell(&self) -> f32 {
        if self.swell_samples == 0 {
            return 1.0;
        }
        let t = (self.count % self.swell_samples) as f32 / self.swell_samples as f32;
        0.5 - 0.5 * (TAU * t).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_interleaved_stereo() {
        let mut tone = ToneSource::new(440.0, 44_100);
        let fragment = tone.next_fragment(128);
        assert_eq!(fragment.len(), 256);
        assert!(fragment.chunks_exact(2).all(|f| f[0] == f[1]));
        assert!(fragment.iter().all(|s| s.abs() <= 0.5));
    }

    #[test]
    fn test_swell_starts_silent() {
        let mut tone = ToneSource::new(440.0, 44_100)
            .with_amplitude(1.0)
            .with_swell(4.0);
        let fragment = tone.next_fragment(8);
        assert!(fragment.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_swell_keeps_moving_on_long_runs() {
        let mut tone = ToneSource::new(440.0, 44_100).with_swell(4.0);
        // Ten minutes in, where an f32 seconds clock has stopped advancing
        tone.count = 600 * 44_100;
        assert!(tone.swell() < 1e-3);

        tone.next_fragment(2 * 44_100);
        assert!(tone.swell() > 0.999);

        tone.next_fragment(44_100);
        assert!((tone.swell() - 0.5).abs() < 1e-3);
    }
}
