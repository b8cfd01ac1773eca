//! Spectrum analysis for the bar terrain
//!
//! Turns a window of recent samples into per-bin magnitudes and a coarser bar
//! sequence. Normalization is adaptive: the ceiling (`max_max`) jumps up to any
//! new peak and slowly sinks back toward quieter input, never below a floor.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::settings::{AnalyzerSettings, ResponseCurve};

/// One analyzed frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    /// Shaped magnitude per FFT bin (window/2 + 1 entries)
    pub bins: Vec<f32>,
    /// Averaged groups of bins, at most `bar_count` entries
    pub bars: Vec<f32>,
    /// Normalization ceiling after this frame
    pub max_max: f32,
    /// Peak absolute amplitude of the raw window
    pub local_max: f32,
    /// Largest bar value
    pub gain: f32,
}

impl Spectrum {
    /// Index of the strongest bin (ties resolve to the lowest index)
    pub fn peak_bin(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &v) in self.bins.iter().enumerate() {
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Hann window weight (symmetric)
#[inline]
pub fn hann_window(index: usize, size: usize) -> f32 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Adaptive-gain FFT analyzer
///
/// Owns the normalization ceiling, so one analyzer per input stream.
pub struct SpectrumAnalyzer {
    config: AnalyzerSettings,
    fft_planner: FftPlanner<f32>,
    /// Cached plan and window for the last window length seen
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    max_max: f32,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalyzerSettings) -> Self {
        let mut fft_planner = FftPlanner::new();
        let fft = fft_planner.plan_fft_forward(config.fft_size.max(1));
        let max_max = config.max_max_floor;
        let mut analyzer = Self {
            config,
            fft_planner,
            fft,
            window: Vec::new(),
            buffer: Vec::new(),
            scratch: Vec::new(),
            max_max,
        };
        analyzer.prepare(analyzer.config.fft_size.max(1));
        analyzer
    }

    pub fn config(&self) -> &AnalyzerSettings {
        &self.config
    }

    /// Current normalization ceiling
    pub fn max_max(&self) -> f32 {
        self.max_max
    }

    pub fn response(&self) -> ResponseCurve {
        self.config.response
    }

    /// Switch between microphone and music shaping
    pub fn set_response(&mut self, response: ResponseCurve) {
        self.config.response = response;
    }

    /// Forget the ceiling history (new session)
    pub fn reset(&mut self) {
        self.max_max = self.config.max_max_floor;
    }

    /// Whether the ceiling sits on its floor
    pub fn is_at_floor(&self) -> bool {
        self.max_max <= self.config.max_max_floor
    }

    /// Re-plan when the window length changes
    fn prepare(&mut self, len: usize) {
        if self.window.len() == len {
            return;
        }
        self.fft = self.fft_planner.plan_fft_forward(len);
        self.window = (0..len).map(|i| hann_window(i, len)).collect();
        self.buffer = vec![Complex::new(0.0, 0.0); len];
        self.scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
    }

    /// Analyze one window of mono samples
    pub fn analyze(&mut self, samples: &[f32]) -> Spectrum {
        let len = samples.len();
        if len == 0 {
            return Spectrum {
                max_max: self.max_max,
                ..Default::default()
            };
        }
        self.prepare(len);

        let floor = self.config.max_max_floor;
        let local_max = samples
            .iter()
            .filter(|s| s.is_finite())
            .fold(0.0f32, |m, s| m.max(s.abs()));
        if local_max > self.max_max {
            self.max_max = local_max;
        }
        // Constructed at the floor, but settings may have been swapped since
        self.max_max = self.max_max.max(floor);

        let max_max = self.max_max;
        for ((slot, &s), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            let s = if s.is_finite() { s } else { 0.0 };
            *slot = Complex::new(s * w / max_max, 0.0);
        }

        if local_max < self.max_max {
            self.max_max -= (self.max_max - local_max) / self.config.decay_divisor;
        }
        if self.max_max < floor {
            self.max_max = floor;
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / len as f32;
        let response = self.config.response;
        let bins: Vec<f32> = self.buffer[..len / 2 + 1]
            .iter()
            .map(|&c| response.apply((c * scale).norm()))
            .collect();

        let bars = self.bars_from_bins(&bins);
        let gain = bars
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f32, f32::max);

        Spectrum {
            bins,
            bars,
            max_max: self.max_max,
            local_max,
            gain,
        }
    }

    /// Average groups of bins into bars, skipping `bin_offset` bars at the bottom
    pub fn bars_from_bins(&self, bins: &[f32]) -> Vec<f32> {
        let bar_count = self.config.bar_count;
        let width = (bins.len() / bar_count.max(1)).max(1);
        let mut bars = Vec::with_capacity(bar_count);

        for bar in 0..bar_count {
            let start = (bar + self.config.bin_offset) * width;
            let end = start + width;
            if end > bins.len() {
                break;
            }
            let sum: f32 = bins[start..end].iter().sum();
            bars.push(sum / width as f32);
        }

        bars
    }
}
