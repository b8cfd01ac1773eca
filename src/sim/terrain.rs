//! Collision of the ball against the spectrum bars
//!
//! The bars form a height field across the stage, one bar per `BAR_WIDTH`
//! units starting at bar `bin_offset`. A bar's surface line sits at
//! `BAR_BASELINE - value * BAR_HEIGHT_SCALE`, truncated to whole units.

use super::state::{Ball, TerrainHit};
use crate::consts::*;
use crate::settings::PhysicsSettings;

/// One resolved contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainContact {
    /// Index into the bar sequence
    pub bar: usize,
    pub hit: TerrainHit,
    /// Surface line the ball was put on
    pub line: f32,
}

/// Surface line of a bar value
#[inline]
pub fn bar_line(value: f32) -> f32 {
    (BAR_BASELINE - value * BAR_HEIGHT_SCALE).trunc()
}

/// Number of bars spanning the stage
#[inline]
pub fn bars_across_stage() -> usize {
    (STAGE_WIDTH / BAR_WIDTH) as usize
}

/// Resolve contacts between the ball and the bar terrain
///
/// `random` yields uniform samples in [0, 1) for the sideways kick. Iteration
/// stops at the first non-finite bar so a degenerate frame never reaches the
/// ball's position or velocity.
pub fn collide_terrain(
    ball: &mut Ball,
    bars: &[f32],
    bin_offset: usize,
    physics: &PhysicsSettings,
    mut random: impl FnMut() -> f32,
) -> Vec<TerrainContact> {
    let mut contacts = Vec::new();
    let last = bin_offset + bars_across_stage();
    let mut x = 0.0f32;

    for i in bin_offset..=last {
        // Neighbour lookups need i + 1
        if i + 1 >= bars.len() {
            break;
        }
        let value = bars[i];
        if !value.is_finite() {
            break;
        }

        let line = bar_line(value);
        let prev = bar_line(bars[i.saturating_sub(1)]);
        let next = bar_line(bars[i + 1]);

        if ball.pos.y - BALL_HALF_HEIGHT >= line {
            let hit = if x - 1.0 == ball.pos.x {
                ball.vel.y = (line - ball.pos.y) / physics.terrain_tick;
                ball.vel.x -= physics.edge_impulse;
                Some(TerrainHit::LeftEdge)
            } else if x + BAR_WIDTH == ball.pos.x {
                ball.vel.y = (line - ball.pos.y) / physics.terrain_tick;
                ball.vel.x += physics.edge_impulse;
                Some(TerrainHit::RightEdge)
            } else if x <= ball.pos.x && ball.pos.x <= x + BAR_WIDTH {
                ball.vel.y = (line - ball.pos.y) / physics.terrain_tick
                    - ball.vel.y * physics.terrain_reflect;
                ball.vel.x += (random() - 0.5) * physics.random_impulse;

                // Roll off slopes
                if prev < line && next > line {
                    ball.vel.x -= physics.edge_impulse;
                }
                if prev > line && next < line {
                    ball.vel.x += physics.edge_impulse;
                }
                Some(TerrainHit::Top)
            } else {
                None
            };

            if let Some(hit) = hit {
                ball.pos.y = line;
                log::trace!("terrain {:?} bar {} line {}", hit, i, line);
                contacts.push(TerrainContact { bar: i, hit, line });
            }
        }

        x += BAR_WIDTH;
    }

    contacts
}
