//! Simulation state and core types
//!
//! Everything the physics mutates between ticks lives here, including the
//! seeded RNG, so two states built from the same seed stay in lockstep.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::spawn_point;

/// Which goal was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// How the ball touched a terrain bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainHit {
    LeftEdge,
    RightEdge,
    Top,
}

/// Things that happened during a tick, for audio and rendering collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Ball entered a goal; `scored` is false while idle
    Goal { side: Side, scored: bool },
    /// Ball ran into a wall tile
    WallHit { col: i32, row: i32 },
    /// Ball was stuck in place and got a random kick
    Unstuck,
    /// Ball hit a reset tile and went back to spawn
    Respawn,
    /// Ball bounced off a spectrum bar
    TerrainBump { bar: usize, hit: TerrainHit },
}

/// The ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            pos: spawn_point(),
            vel: Vec2::ZERO,
        }
    }
}

impl Ball {
    pub fn at(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }

    /// Back to spawn, keeping velocity
    pub fn respawn(&mut self) {
        self.pos = spawn_point();
    }

    /// Back to spawn, at rest
    pub fn reset(&mut self) {
        self.pos = spawn_point();
        self.vel = Vec2::ZERO;
    }

    /// Resting on the line that floor bounces put the ball back to
    pub fn on_floor(&self) -> bool {
        self.pos.y == FLOOR_REST
    }
}

/// Goal counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub left: u32,
    pub right: u32,
}

impl Scores {
    pub fn record(&mut self, side: Side) {
        match side {
            Side::Left => self.left += 1,
            Side::Right => self.right += 1,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the renderer needs to draw the ball and its effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub shake_ticks: u32,
    pub distortion: i32,
    pub rotation: f32,
}

/// Complete physics state
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed the RNG was built from
    pub seed: u64,
    pub ball: Ball,
    pub scores: Scores,
    /// Ticks of screen shake left
    pub shake_ticks: u32,
    /// Visual distortion strength for this tick
    pub distortion: i32,
    /// Phase accumulator driving the ambient drift and the visual wobble
    pub rotation: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
}

impl SimState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ball: Ball::default(),
            scores: Scores::default(),
            shake_ticks: 0,
            distortion: 0,
            rotation: 0.0,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform sample in [0, 1)
    pub fn random_unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Ball at rest on spawn, effects cleared (level switch)
    pub fn reset_ball(&mut self) {
        self.ball.reset();
        self.shake_ticks = 0;
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            pos: self.ball.pos,
            vel: self.ball.vel,
            shake_ticks: self.shake_ticks,
            distortion: self.distortion,
            rotation: self.rotation,
        }
    }
}
