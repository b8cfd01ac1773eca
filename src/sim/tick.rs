//! Fixed timestep simulation tick
//!
//! Advances the ball one logic step against the current spectrum bars and
//! the active level. Same seed, same inputs, same trajectory.

use glam::Vec2;
use rand::Rng;

use super::grid::{TileHit, trace_path};
use super::state::{GameEvent, Side, SimState};
use super::terrain::collide_terrain;
use crate::consts::*;
use crate::level::{Level, TileKind};
use crate::settings::PhysicsSettings;
use crate::{cell_to_position, position_to_cell};

/// Per-tick inputs coming from the analyzer and the mode controller
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Normalized bars of the current frame
    pub bars: &'a [f32],
    /// Loudest bar of the frame
    pub gain: f32,
    /// First bar laid out at x = 0
    pub bin_offset: usize,
    /// Goals count only while playing
    pub scoring: bool,
}

impl<'a> TickInput<'a> {
    pub fn new(bars: &'a [f32]) -> Self {
        Self {
            bars,
            gain: 0.0,
            bin_offset: BARS_OFFSET,
            scoring: true,
        }
    }
}

/// Advance the simulation by one tick, returning what happened
pub fn tick(
    state: &mut SimState,
    input: &TickInput,
    level: &Level,
    physics: &PhysicsSettings,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.time_ticks += 1;

    // Loudness spins the wobble phase
    let gain = if input.gain.is_finite() {
        input.gain.max(0.0)
    } else {
        0.0
    };
    state.distortion = (gain * 2.0) as i32;
    state.rotation += state.distortion as f32 * 3.0;

    let old_pos = state.ball.pos;
    integrate(state, physics);
    apply_bounds(state, physics);

    let SimState { ball, rng, .. } = state;
    for contact in collide_terrain(ball, input.bars, input.bin_offset, physics, || {
        rng.random::<f32>()
    }) {
        events.push(GameEvent::TerrainBump {
            bar: contact.bar,
            hit: contact.hit,
        });
    }

    let trace = trace_path(
        level,
        position_to_cell(old_pos),
        position_to_cell(state.ball.pos),
    );
    let mut respawned = false;
    if let Some(hit) = trace.hit {
        match hit.kind {
            TileKind::LeftGoal | TileKind::RightGoal => {
                let side = if hit.kind == TileKind::LeftGoal {
                    Side::Left
                } else {
                    Side::Right
                };
                state.ball.reset();
                state.shake_ticks = physics.shake_ticks;
                if input.scoring {
                    state.scores.record(side);
                }
                log::debug!(
                    "Goal {:?} at ({}, {}), scored: {}",
                    side,
                    hit.col,
                    hit.row,
                    input.scoring
                );
                events.push(GameEvent::Goal {
                    side,
                    scored: input.scoring,
                });
                respawned = true;
            }
            TileKind::Wall => {
                resolve_wall(state, hit, trace.last_free, old_pos, physics, &mut events);
            }
            TileKind::Reset => {
                state.ball.respawn();
                events.push(GameEvent::Respawn);
                respawned = true;
            }
            TileKind::Empty | TileKind::Decor => {}
        }
    }

    if !respawned {
        state.ball.vel.x += (state.rotation / physics.drift_period).sin() / physics.drift_divisor;
    }

    if state.shake_ticks > 0 {
        state.distortion = (state.random_unit() * physics.shake_distortion) as i32;
        state.rotation += state.distortion as f32;
        state.shake_ticks -= 1;
    }

    events
}

/// Move, then apply friction and gravity
fn integrate(state: &mut SimState, physics: &PhysicsSettings) {
    let ball = &mut state.ball;
    ball.pos += ball.vel;
    ball.vel.x = toward_zero(ball.vel.x, physics.air_friction);
    ball.vel.y += physics.gravity;
}

/// Floor bounce and stage sides
fn apply_bounds(state: &mut SimState, physics: &PhysicsSettings) {
    let ball = &mut state.ball;

    if ball.pos.y > FLOOR_LINE {
        ball.vel.y = -ball.vel.y / physics.floor_bounce_divisor;
        ball.pos.y = FLOOR_REST;
    }

    if ball.pos.x < 0.0 {
        ball.pos.x = 0.0;
        ball.vel.x = -ball.vel.x;
    } else if ball.pos.x > STAGE_WIDTH {
        ball.pos.x = STAGE_WIDTH;
        ball.vel.x = -ball.vel.x;
    }

    if ball.on_floor() {
        ball.vel.x = toward_zero(ball.vel.x, physics.floor_friction);
    }
}

fn resolve_wall(
    state: &mut SimState,
    hit: TileHit,
    last_free: (i32, i32),
    old_pos: Vec2,
    physics: &PhysicsSettings,
    events: &mut Vec<GameEvent>,
) {
    if state.ball.pos != cell_to_position(hit.col, hit.row) {
        state.distortion = 3;
    }

    let reverted = cell_to_position(last_free.0, last_free.1);
    state.ball.pos = reverted;

    let escape = |c: f32| {
        if c.abs() < physics.wall_min_speed {
            c * physics.wall_escape_multiplier
        } else {
            c
        }
    };
    let vel = -state.ball.vel * physics.wall_damping;
    state.ball.vel = Vec2::new(escape(vel.x), escape(vel.y));
    events.push(GameEvent::WallHit {
        col: hit.col,
        row: hit.row,
    });

    if reverted == old_pos {
        let span = physics.unstick_span;
        let vx = (state.random_unit() - 0.5) * span;
        let vy = (state.random_unit() - 0.5) * span;
        state.ball.vel = Vec2::new(vx, vy);
        log::debug!("Ball stuck at {:?}, kicked to {:?}", reverted, state.ball.vel);
        events.push(GameEvent::Unstuck);
    }
}

/// Reduce magnitude by `step` without crossing zero
#[inline]
fn toward_zero(v: f32, step: f32) -> f32 {
    if v > 0.0 {
        (v - step).max(0.0)
    } else if v < 0.0 {
        (v + step).min(0.0)
    } else {
        v
    }
}
