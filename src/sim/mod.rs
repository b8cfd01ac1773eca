//! Deterministic simulation module
//!
//! All ball physics lives here. This module must be pure and deterministic:
//! - One fixed step per call
//! - Seeded RNG only
//! - No audio, rendering or platform dependencies

pub mod grid;
pub mod state;
pub mod terrain;
pub mod tick;

pub use grid::{PathTrace, TileHit, trace_path};
pub use state::{Ball, BallSnapshot, GameEvent, Scores, Side, SimState, TerrainHit};
pub use terrain::{TerrainContact, bar_line, collide_terrain};
pub use tick::{TickInput, tick};
