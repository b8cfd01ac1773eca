//! Waaaa - audio-reactive spectrum terrain with a bouncing ball
//!
//! Core modules:
//! - `audio`: Ring buffer ingestion and FFT bar spectrum
//! - `sim`: Deterministic ball physics against the spectrum and the tile grid
//! - `level`: Fixed-size tile grids and where they come from
//! - `mode`: Idle/Active state machine driven by signal strength
//! - `session`: Ties the pieces together behind a per-tick call site
//! - `settings`: Data-driven tuning

pub mod audio;
pub mod error;
pub mod level;
pub mod mode;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{Error, Result};
pub use level::{Level, LevelSource, TileKind};
pub use mode::{Mode, ModeController};
pub use session::Session;
pub use settings::Settings;

use glam::Vec2;

/// Stage and physics constants (tuned by eye, keep the numbers)
pub mod consts {
    /// Logic ticks per second driven by the host loop
    pub const TICK_RATE: u32 = 60;

    /// Stage dimensions in position units
    pub const STAGE_WIDTH: f32 = 320.0;
    pub const STAGE_HEIGHT: f32 = 180.0;

    /// Level grid dimensions (columns x rows)
    pub const GRID_COLS: usize = 80;
    pub const GRID_ROWS: usize = 45;
    /// Position units per grid cell
    pub const CELL_SIZE: f32 = 4.0;

    /// Ball half extents (drawn as a 6x6 square)
    pub const BALL_HALF_WIDTH: f32 = 3.0;
    pub const BALL_HALF_HEIGHT: f32 = 3.0;

    /// Ball spawn point (stage center, a bit below the middle)
    pub const SPAWN_X: f32 = STAGE_WIDTH / 2.0;
    pub const SPAWN_Y: f32 = 120.0;

    /// Crossing this line triggers a floor bounce
    pub const FLOOR_LINE: f32 = STAGE_HEIGHT - BALL_HALF_HEIGHT - 5.0;
    /// Where the ball is put back after a floor bounce
    pub const FLOOR_REST: f32 = STAGE_HEIGHT - 2.0 - 5.0;

    /// Baseline of the spectrum bars and their height scale
    pub const BAR_BASELINE: f32 = 176.0;
    pub const BAR_HEIGHT_SCALE: f32 = 64.0;
    /// Width of one terrain bar in position units
    pub const BAR_WIDTH: f32 = 4.0;

    /// Working sample rate of the analysis pipeline
    pub const SAMPLE_RATE: usize = 44_100;
    /// FFT window length
    pub const FFT_SAMPLES: usize = 8192;
    /// Number of bars the spectrum is reduced to
    pub const BARS_NUM: usize = FFT_SAMPLES / 2;
    /// Bars skipped at the low end (DC and rumble)
    pub const BARS_OFFSET: usize = 8;

    /// Lowest value the normalization ceiling may reach
    pub const MAX_MAX_FLOOR: f32 = 0.042;
    /// Fraction of the gap the ceiling closes per frame while decaying
    pub const MAX_MAX_DECAY_DIVISOR: f32 = 1024.0;
}

/// Convert a continuous position to the grid cell containing it
#[inline]
pub fn position_to_cell(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / consts::CELL_SIZE).floor() as i32,
        (pos.y / consts::CELL_SIZE).floor() as i32,
    )
}

/// Top-left corner of a grid cell in position units
#[inline]
pub fn cell_to_position(col: i32, row: i32) -> Vec2 {
    Vec2::new(col as f32 * consts::CELL_SIZE, row as f32 * consts::CELL_SIZE)
}

/// Spawn point as a vector
#[inline]
pub fn spawn_point() -> Vec2 {
    Vec2::new(consts::SPAWN_X, consts::SPAWN_Y)
}
