//! Audio ingestion and spectrum analysis
//!
//! Producer side (capture callback, tone generator) writes into the shared
//! ring; the logic tick reads a window and runs the analyzer on its own copy.

#[cfg(feature = "capture")]
pub mod capture;
pub mod ring;
pub mod spectrum;
pub mod tone;

pub use ring::{RingBuffer, RingReader, RingWriter, downmix, downmix_into};
pub use spectrum::{Spectrum, SpectrumAnalyzer, hann_window};
pub use tone::ToneSource;

/// Sound effects the core asks the host to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A goal was scored
    Point,
}

/// Host-side sink for sound effects
pub trait EffectSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn play(&mut self, effect: SoundEffect) {
        log::info!("Sound effect: {:?}", effect);
    }
}
