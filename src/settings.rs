//! Tuning and preferences
//!
//! Every number the pipeline and the physics were tuned with lives here so a
//! JSON file can override it. Defaults are the tuned values; change with care.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// How bin magnitudes are shaped before they become bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResponseCurve {
    /// Snappy, saturating response for a live microphone
    #[default]
    Microphone,
    /// Compressive response for full-range music
    Music,
}

impl ResponseCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCurve::Microphone => "Microphone",
            ResponseCurve::Music => "Music",
        }
    }

    /// Shape a single scaled bin magnitude
    #[inline]
    pub fn apply(&self, magnitude: f32) -> f32 {
        match self {
            ResponseCurve::Music => magnitude.sqrt().sqrt() * 2.0,
            ResponseCurve::Microphone => (magnitude * 100.0).min(1.0),
        }
    }
}

/// Spectrum analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Working sample rate (Hz); also the ring buffer capacity
    pub sample_rate: usize,
    /// FFT window length (power of two)
    pub fft_size: usize,
    /// Maximum number of bars produced
    pub bar_count: usize,
    /// Bars skipped at the low end
    pub bin_offset: usize,
    pub response: ResponseCurve,
    /// Normalization ceiling floor
    pub max_max_floor: f32,
    /// Decay divisor of the normalization ceiling
    pub decay_divisor: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            fft_size: FFT_SAMPLES,
            bar_count: BARS_NUM,
            bin_offset: BARS_OFFSET,
            response: ResponseCurve::Microphone,
            max_max_floor: MAX_MAX_FLOOR,
            decay_divisor: MAX_MAX_DECAY_DIVISOR,
        }
    }
}

/// Ball physics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Added to vy every tick
    pub gravity: f32,
    /// Horizontal speed lost per tick in the air
    pub air_friction: f32,
    /// Extra horizontal speed lost per tick while resting on the floor
    pub floor_friction: f32,
    /// Vertical speed divisor on floor bounce
    pub floor_bounce_divisor: f32,
    /// Penetration-to-velocity divisor for terrain bounces
    pub terrain_tick: f32,
    /// Share of incoming vy reflected on a terrain bounce
    pub terrain_reflect: f32,
    /// Horizontal kick at bar edges and on slopes
    pub edge_impulse: f32,
    /// Full span of the random horizontal kick on a terrain bounce
    pub random_impulse: f32,
    /// Velocity kept (and inverted) on a wall hit
    pub wall_damping: f32,
    /// Components slower than this after a wall hit get amplified
    pub wall_min_speed: f32,
    pub wall_escape_multiplier: f32,
    /// Full span of the random velocity used to unstick the ball
    pub unstick_span: f32,
    /// Ticks of shake after a goal
    pub shake_ticks: u32,
    /// Upper bound of the random distortion while shaking
    pub shake_distortion: f32,
    /// Rotation divisor of the ambient drift
    pub drift_period: f32,
    /// Drift force divisor
    pub drift_divisor: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            air_friction: 0.005,
            floor_friction: 0.01,
            floor_bounce_divisor: 3.0,
            terrain_tick: 15.0,
            terrain_reflect: 0.5,
            edge_impulse: 2.0,
            random_impulse: 2.0,
            wall_damping: 0.5,
            wall_min_speed: 0.2,
            wall_escape_multiplier: 10.0,
            unstick_span: 5.0,
            shake_ticks: 120,
            shake_distortion: 15.0,
            drift_period: 20.0,
            drift_divisor: 75.0,
        }
    }
}

/// Idle/Active switching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSettings {
    /// Consecutive ticks at the floor before going idle
    pub idle_after_ticks: u32,
    /// Consecutive ticks above the floor before waking up
    pub wake_after_ticks: u32,
    /// Level played while active
    pub active_level: String,
    /// Level shown while idle
    pub idle_level: String,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            idle_after_ticks: 10 * TICK_RATE,
            wake_after_ticks: 3,
            active_level: "multi".to_string(),
            idle_level: "border".to_string(),
        }
    }
}

/// All settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analyzer: AnalyzerSettings,
    pub physics: PhysicsSettings,
    pub mode: ModeSettings,
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> Result<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let a = &self.analyzer;
        if !a.fft_size.is_power_of_two() {
            return Err(Error::InvalidSettings(format!(
                "FFT size must be power of 2, got {}",
                a.fft_size
            )));
        }
        if a.sample_rate == 0 || a.bar_count == 0 {
            return Err(Error::InvalidSettings(
                "sample rate and bar count must be > 0".to_string(),
            ));
        }
        if a.fft_size > a.sample_rate {
            return Err(Error::InvalidSettings(format!(
                "FFT size {} exceeds ring capacity {}",
                a.fft_size, a.sample_rate
            )));
        }
        if !(a.max_max_floor > 0.0) || !(a.decay_divisor >= 1.0) {
            return Err(Error::InvalidSettings(
                "ceiling floor must be > 0 and decay divisor >= 1".to_string(),
            ));
        }
        let p = &self.physics;
        if [p.terrain_tick, p.floor_bounce_divisor, p.drift_period, p.drift_divisor].contains(&0.0) {
            return Err(Error::InvalidSettings(
                "physics divisors must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "analyzer": { "response": "Music" }, "physics": { "gravity": 0.1 } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.analyzer.response, ResponseCurve::Music);
        assert_eq!(settings.analyzer.fft_size, FFT_SAMPLES);
        assert!((settings.physics.gravity - 0.1).abs() < f32::EPSILON);
        assert_eq!(settings.physics.shake_ticks, 120);
        assert_eq!(settings.mode.active_level, "multi");
    }

    #[test]
    fn test_rejects_non_power_of_two_fft() {
        let mut settings = Settings::default();
        settings.analyzer.fft_size = 1000;
        assert!(matches!(settings.validate(), Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/waaaa-settings.json")).unwrap();
        assert_eq!(settings.analyzer.bar_count, BARS_NUM);
    }

    #[test]
    fn test_response_curves() {
        assert_eq!(ResponseCurve::Microphone.apply(0.5), 1.0);
        assert!((ResponseCurve::Microphone.apply(0.005) - 0.5).abs() < 1e-6);
        assert!((ResponseCurve::Music.apply(0.0625) - 1.0).abs() < 1e-6);
        assert_eq!(ResponseCurve::Music.apply(0.0), 0.0);
    }
}
