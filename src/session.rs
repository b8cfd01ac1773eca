//! Per-tick orchestration
//!
//! A `Session` is the consumer side of the audio handoff: each call to
//! [`Session::tick`] copies the latest window out of the ring, analyzes it,
//! lets the mode controller react and advances the ball once.

use serde::Serialize;

use crate::audio::{EffectSink, RingReader, SoundEffect, Spectrum, SpectrumAnalyzer};
use crate::error::Result;
use crate::level::{Level, LevelSource};
use crate::mode::{Mode, ModeController, ModeTransition};
use crate::settings::{ResponseCurve, Settings};
use crate::sim::{BallSnapshot, GameEvent, Scores, SimState, TickInput, tick};

/// Serializable view of one tick, for dumps and external renderers
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub mode: Mode,
    pub level: String,
    pub ball: BallSnapshot,
    pub scores: Scores,
    pub gain: f32,
    pub max_max: f32,
}

pub struct Session {
    settings: Settings,
    reader: RingReader,
    analyzer: SpectrumAnalyzer,
    /// Reused window copy, filled under the ring lock
    window: Vec<f32>,
    spectrum: Spectrum,
    sim: SimState,
    mode: ModeController,
    level: Level,
    levels: Box<dyn LevelSource>,
    effects: Box<dyn EffectSink>,
}

impl Session {
    /// Build a session in Idle mode with the idle level loaded
    pub fn new(
        settings: Settings,
        reader: RingReader,
        levels: Box<dyn LevelSource>,
        effects: Box<dyn EffectSink>,
        seed: u64,
    ) -> Result<Self> {
        settings.validate()?;

        let mode = ModeController::new(settings.mode.clone());
        let level = levels.load(mode.current_level())?;
        log::info!(
            "Session: level {}, seed {}, {} sample window",
            level.name(),
            seed,
            settings.analyzer.fft_size
        );

        if reader.capacity() < settings.analyzer.fft_size {
            log::warn!(
                "Ring holds {} samples, shorter than the {} sample window",
                reader.capacity(),
                settings.analyzer.fft_size
            );
        }

        Ok(Self {
            analyzer: SpectrumAnalyzer::new(settings.analyzer.clone()),
            window: Vec::with_capacity(settings.analyzer.fft_size),
            spectrum: Spectrum::default(),
            sim: SimState::new(seed),
            mode,
            level,
            levels,
            effects,
            reader,
            settings,
        })
    }

    /// Advance one logic tick
    pub fn tick(&mut self) -> Vec<GameEvent> {
        self.reader
            .read_window_into(self.settings.analyzer.fft_size, &mut self.window);
        self.spectrum = self.analyzer.analyze(&self.window);

        if let Some(transition) = self
            .mode
            .update(self.spectrum.max_max, self.settings.analyzer.max_max_floor)
        {
            self.apply_transition(transition);
        }

        let input = TickInput {
            bars: &self.spectrum.bars,
            gain: self.spectrum.gain,
            bin_offset: self.settings.analyzer.bin_offset,
            scoring: self.mode.mode().scoring(),
        };
        let events = tick(&mut self.sim, &input, &self.level, &self.settings.physics);

        for event in &events {
            if let GameEvent::Goal { scored: true, .. } = event {
                self.effects.play(SoundEffect::Point);
            }
        }

        events
    }

    /// Tell the session whether a live input is feeding the ring
    pub fn set_input_available(&mut self, available: bool) {
        if let Some(transition) = self.mode.set_input_available(available) {
            self.apply_transition(transition);
        }
    }

    pub fn set_response(&mut self, response: ResponseCurve) {
        self.analyzer.set_response(response);
    }

    /// Start over: fresh analyzer ceiling, silent ring, ball on spawn
    pub fn restart(&mut self, seed: u64) {
        self.analyzer.reset();
        self.reader.reset();
        self.spectrum = Spectrum {
            max_max: self.analyzer.max_max(),
            ..Default::default()
        };
        self.sim = SimState::new(seed);
        let name = self.mode.current_level().to_string();
        self.switch_level(&name);
    }

    /// Load a level by name and put the ball back on spawn at rest
    ///
    /// The current level stays when `name` cannot be loaded.
    pub fn load_level(&mut self, name: &str) -> Result<()> {
        let level = self.levels.load(name)?;
        log::info!("Level {}", level.name());
        self.level = level;
        self.sim.reset_ball();
        Ok(())
    }

    /// Swap between the active and idle levels, mode unchanged
    pub fn toggle_level(&mut self) -> Result<()> {
        let name = if self.level.name() == self.settings.mode.active_level {
            self.settings.mode.idle_level.clone()
        } else {
            self.settings.mode.active_level.clone()
        };
        self.load_level(&name)
    }

    pub fn reset_scores(&mut self) {
        log::info!("Scores reset");
        self.sim.scores.reset();
    }

    fn apply_transition(&mut self, transition: ModeTransition) {
        log::info!(
            "Mode {} -> {}",
            transition.from.as_str(),
            transition.to.as_str()
        );
        self.switch_level(&transition.level);
        if transition.respawn {
            self.sim.reset_ball();
        }
        if transition.reset_scores {
            self.sim.scores.reset();
        }
    }

    fn switch_level(&mut self, name: &str) {
        if let Err(e) = self.load_level(name) {
            log::warn!("Keeping level {}: {}", self.level.name(), e);
        }
    }

    /// Bars of the last analyzed frame
    pub fn bars(&self) -> &[f32] {
        &self.spectrum.bars
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn ball(&self) -> BallSnapshot {
        self.sim.snapshot()
    }

    pub fn scores(&self) -> Scores {
        self.sim.scores
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.sim.time_ticks,
            mode: self.mode(),
            level: self.level.name().to_string(),
            ball: self.ball(),
            scores: self.scores(),
            gain: self.spectrum.gain,
            max_max: self.spectrum.max_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::{RingWriter, ToneSource, ring};
    use crate::error::Error;
    use crate::level::{BuiltinLevels, TileKind};
    use crate::settings::AnalyzerSettings;

    #[derive(Clone, Default)]
    struct RecordingSink(Rc<RefCell<Vec<SoundEffect>>>);

    impl EffectSink for RecordingSink {
        fn play(&mut self, effect: SoundEffect) {
            self.0.borrow_mut().push(effect);
        }
    }

    /// "multi" has a goal row right under spawn; nothing else exists
    struct GoalUnderSpawn;

    impl LevelSource for GoalUnderSpawn {
        fn load(&self, name: &str) -> Result<Level> {
            match name {
                "border" => Ok(Level::empty("border")),
                "multi" => {
                    let mut level = Level::empty("multi");
                    for col in 0..80 {
                        level.set_tile(col, 31, TileKind::LeftGoal);
                    }
                    Ok(level)
                }
                _ => Err(Error::LevelNotFound(name.to_string())),
            }
        }
    }

    /// Only the idle level exists
    struct IdleOnly;

    impl LevelSource for IdleOnly {
        fn load(&self, name: &str) -> Result<Level> {
            if name == "border" {
                Ok(Level::empty("border"))
            } else {
                Err(Error::LevelNotFound(name.to_string()))
            }
        }
    }

    fn small_settings() -> Settings {
        Settings {
            analyzer: AnalyzerSettings {
                fft_size: 1024,
                bar_count: 512,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn session_with(
        levels: Box<dyn LevelSource>,
        sink: RecordingSink,
    ) -> (Session, RingWriter) {
        let (writer, reader) = ring::channel(1024);
        let session = Session::new(small_settings(), reader, levels, Box::new(sink), 11).unwrap();
        (session, writer)
    }

    /// High enough that no terrain bar lights up
    fn tone() -> ToneSource {
        ToneSource::new(10_000.0, 44_100).with_amplitude(0.5)
    }

    #[test]
    fn test_silent_session_stays_idle() {
        let (mut session, _writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        for _ in 0..50 {
            session.tick();
        }
        assert_eq!(session.mode(), Mode::Idle);
        assert_eq!(session.level().name(), "border");
        assert!(session.bars().iter().all(|&b| b == 0.0));
        assert_eq!(session.spectrum().max_max, 0.042);
    }

    #[test]
    fn test_signal_wakes_session() {
        let (mut session, writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        let mut tone = tone();

        for _ in 0..3 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        assert_eq!(session.mode(), Mode::Active);
        assert_eq!(session.level().name(), "multi");
        assert_eq!(session.scores(), Scores::default());
        assert!(!session.bars().is_empty());
    }

    #[test]
    fn test_scored_goal_plays_point() {
        let sink = RecordingSink::default();
        let played = Rc::clone(&sink.0);
        let (mut session, writer) = session_with(Box::new(GoalUnderSpawn), sink);
        let mut tone = tone();

        for _ in 0..40 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        assert_eq!(session.mode(), Mode::Active);
        let scores = session.scores();
        assert!(scores.left >= 1);
        assert_eq!(scores.right, 0);
        assert_eq!(played.borrow().len(), scores.left as usize);
        assert!(played.borrow().iter().all(|&e| e == SoundEffect::Point));
    }

    #[test]
    fn test_missing_level_keeps_current() {
        let (mut session, writer) = session_with(Box::new(IdleOnly), RecordingSink::default());
        let mut tone = tone();

        for _ in 0..3 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        assert_eq!(session.mode(), Mode::Active);
        assert_eq!(session.level().name(), "border");
    }

    #[test]
    fn test_passive_session_never_scores() {
        let sink = RecordingSink::default();
        let played = Rc::clone(&sink.0);
        let (mut session, writer) = session_with(Box::new(GoalUnderSpawn), sink);
        session.set_input_available(false);
        let mut tone = tone();

        for _ in 0..40 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        assert_eq!(session.mode(), Mode::Idle);
        assert_eq!(session.scores(), Scores::default());
        assert!(played.borrow().is_empty());
    }

    #[test]
    fn test_restart_clears_state() {
        let (mut session, writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        let mut tone = tone();
        for _ in 0..5 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        session.restart(11);
        assert_eq!(session.frame().tick, 0);
        assert_eq!(session.spectrum().max_max, 0.042);
        assert!(session.bars().is_empty());

        session.tick();
        assert_eq!(session.spectrum().local_max, 0.0);
    }

    #[test]
    fn test_load_level_respawns_at_rest() {
        let (mut session, _writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        for _ in 0..20 {
            session.tick();
        }
        assert_ne!(session.ball().pos, crate::spawn_point());

        session.load_level("multi").unwrap();
        assert_eq!(session.level().name(), "multi");
        assert_eq!(session.ball().pos, crate::spawn_point());
        assert_eq!(session.ball().vel, glam::Vec2::ZERO);
        assert_eq!(session.mode(), Mode::Idle);

        assert!(matches!(
            session.load_level("nope"),
            Err(Error::LevelNotFound(_))
        ));
        assert_eq!(session.level().name(), "multi");
    }

    #[test]
    fn test_toggle_level_swaps_between_levels() {
        let (mut session, _writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        assert_eq!(session.level().name(), "border");
        session.toggle_level().unwrap();
        assert_eq!(session.level().name(), "multi");
        session.toggle_level().unwrap();
        assert_eq!(session.level().name(), "border");
    }

    #[test]
    fn test_reset_scores_keeps_playing() {
        let (mut session, writer) =
            session_with(Box::new(GoalUnderSpawn), RecordingSink::default());
        let mut tone = tone();
        for _ in 0..40 {
            writer.push_fragment(&tone.next_fragment(735), 2);
            session.tick();
        }
        assert!(session.scores().left >= 1);

        session.reset_scores();
        assert_eq!(session.scores(), Scores::default());
        assert_eq!(session.mode(), Mode::Active);
        assert_eq!(session.level().name(), "multi");
    }

    #[test]
    fn test_frame_serializes() {
        let (mut session, _writer) =
            session_with(Box::new(BuiltinLevels), RecordingSink::default());
        session.tick();
        let json = serde_json::to_string(&session.frame()).unwrap();
        assert!(json.contains("\"mode\":\"Idle\""));
        assert!(json.contains("\"level\":\"border\""));
    }
}
