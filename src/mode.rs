//! Idle/Active mode switching
//!
//! The only input is the analyzer's normalization ceiling. It sits on its
//! floor when nobody is playing, so a sustained run at the floor means idle
//! and a short run above it means someone is back.

use serde::{Deserialize, Serialize};

use crate::settings::ModeSettings;

/// Coarse presentation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Demo presentation, no scoring
    #[default]
    Idle,
    /// Interactive play
    Active,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Active => "active",
        }
    }

    pub fn scoring(&self) -> bool {
        matches!(self, Mode::Active)
    }
}

/// A mode change and the entry actions it requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: Mode,
    pub to: Mode,
    /// Level to load on entry
    pub level: String,
    /// Put the ball back on spawn at rest
    pub respawn: bool,
    pub reset_scores: bool,
}

/// Hysteresis state machine over the ceiling-vs-floor reading
#[derive(Debug, Clone)]
pub struct ModeController {
    settings: ModeSettings,
    mode: Mode,
    /// Consecutive ticks at the floor
    quiet_ticks: u32,
    /// Consecutive ticks above the floor
    loud_ticks: u32,
    /// No live input; never leaves Idle
    passive: bool,
}

impl ModeController {
    /// Starts Idle: the ceiling starts on its floor
    pub fn new(settings: ModeSettings) -> Self {
        Self {
            settings,
            mode: Mode::Idle,
            quiet_ticks: 0,
            loud_ticks: 0,
            passive: false,
        }
    }

    /// Pinned to Idle for sessions without a live input
    pub fn passive(settings: ModeSettings) -> Self {
        Self {
            passive: true,
            ..Self::new(settings)
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    /// Level that belongs to the current mode
    pub fn current_level(&self) -> &str {
        self.level_for(self.mode)
    }

    fn level_for(&self, mode: Mode) -> &str {
        match mode {
            Mode::Idle => &self.settings.idle_level,
            Mode::Active => &self.settings.active_level,
        }
    }

    /// Switch between live and passive input; losing input drops to Idle
    pub fn set_input_available(&mut self, available: bool) -> Option<ModeTransition> {
        self.passive = !available;
        self.quiet_ticks = 0;
        self.loud_ticks = 0;
        if self.passive && self.mode == Mode::Active {
            log::info!("Input lost, switching to idle");
            return Some(self.enter(Mode::Idle));
        }
        None
    }

    /// Feed one tick's ceiling reading
    pub fn update(&mut self, max_max: f32, floor: f32) -> Option<ModeTransition> {
        if self.passive {
            return None;
        }

        if max_max <= floor {
            self.quiet_ticks = self.quiet_ticks.saturating_add(1);
            self.loud_ticks = 0;
        } else {
            self.loud_ticks = self.loud_ticks.saturating_add(1);
            self.quiet_ticks = 0;
        }

        match self.mode {
            Mode::Active if self.quiet_ticks >= self.settings.idle_after_ticks => {
                log::info!("Signal at floor for {} ticks, going idle", self.quiet_ticks);
                Some(self.enter(Mode::Idle))
            }
            Mode::Idle if self.loud_ticks >= self.settings.wake_after_ticks => {
                log::info!("Signal back above floor, going active");
                Some(self.enter(Mode::Active))
            }
            _ => None,
        }
    }

    fn enter(&mut self, to: Mode) -> ModeTransition {
        let from = self.mode;
        self.mode = to;
        self.quiet_ticks = 0;
        self.loud_ticks = 0;
        ModeTransition {
            from,
            to,
            level: self.level_for(to).to_string(),
            respawn: true,
            reset_scores: to == Mode::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: f32 = 0.042;

    fn settings() -> ModeSettings {
        ModeSettings {
            idle_after_ticks: 10,
            wake_after_ticks: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_idle() {
        let controller = ModeController::new(settings());
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(controller.current_level(), "border");
        assert!(!controller.mode().scoring());
    }

    #[test]
    fn test_wakes_after_sustained_signal() {
        let mut controller = ModeController::new(settings());
        assert_eq!(controller.update(0.5, FLOOR), None);
        assert_eq!(controller.update(0.5, FLOOR), None);
        let transition = controller.update(0.5, FLOOR).unwrap();
        assert_eq!(transition.from, Mode::Idle);
        assert_eq!(transition.to, Mode::Active);
        assert_eq!(transition.level, "multi");
        assert!(transition.reset_scores);
        assert!(transition.respawn);
        assert_eq!(controller.mode(), Mode::Active);
    }

    #[test]
    fn test_single_blip_does_not_wake() {
        let mut controller = ModeController::new(settings());
        for _ in 0..20 {
            assert_eq!(controller.update(0.5, FLOOR), None);
            assert_eq!(controller.update(0.5, FLOOR), None);
            assert_eq!(controller.update(FLOOR, FLOOR), None);
        }
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_goes_idle_after_sustained_floor() {
        let mut controller = ModeController::new(settings());
        for _ in 0..3 {
            controller.update(0.5, FLOOR);
        }
        assert_eq!(controller.mode(), Mode::Active);

        for _ in 0..9 {
            assert_eq!(controller.update(FLOOR, FLOOR), None);
        }
        // A loud tick restarts the count
        assert_eq!(controller.update(0.3, FLOOR), None);
        for _ in 0..9 {
            assert_eq!(controller.update(FLOOR, FLOOR), None);
        }
        let transition = controller.update(FLOOR, FLOOR).unwrap();
        assert_eq!(transition.to, Mode::Idle);
        assert_eq!(transition.level, "border");
        assert!(!transition.reset_scores);
    }

    #[test]
    fn test_passive_never_wakes() {
        let mut controller = ModeController::passive(settings());
        for _ in 0..100 {
            assert_eq!(controller.update(1.0, FLOOR), None);
        }
        assert_eq!(controller.mode(), Mode::Idle);
        assert!(controller.is_passive());
    }

    #[test]
    fn test_losing_input_drops_to_idle() {
        let mut controller = ModeController::new(settings());
        for _ in 0..3 {
            controller.update(0.5, FLOOR);
        }
        let transition = controller.set_input_available(false).unwrap();
        assert_eq!(transition.to, Mode::Idle);
        assert_eq!(controller.set_input_available(true), None);
        assert_eq!(controller.mode(), Mode::Idle);
    }
}
