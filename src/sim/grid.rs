//! Discrete path tracing through the tile grid
//!
//! Fast balls can cross several cells per tick, so collision walks the cells
//! between the old and new positions instead of sampling only the endpoint.

use crate::level::{Level, TileKind};

/// The first stopping tile met along a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileHit {
    pub kind: TileKind,
    pub col: i32,
    pub row: i32,
}

/// Result of walking from one cell to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTrace {
    pub hit: Option<TileHit>,
    /// Last cell visited before the hit (the origin if nothing was free)
    pub last_free: (i32, i32),
}

/// Walk from `from` to `to`, one step per axis per iteration
///
/// The origin cell is only checked when the ball did not change cell. Cells
/// outside the grid read as empty, so the walk never indexes out of bounds
/// and a ball re-entering from off-stage is still caught.
pub fn trace_path(level: &Level, from: (i32, i32), to: (i32, i32)) -> PathTrace {
    if from == to {
        let kind = level.tile_at(to.0, to.1);
        let hit = kind.stops_ball().then_some(TileHit {
            kind,
            col: to.0,
            row: to.1,
        });
        return PathTrace {
            hit,
            last_free: from,
        };
    }

    let (mut col, mut row) = from;
    let mut last_free = from;

    while (col, row) != to {
        col += (to.0 - col).signum();
        row += (to.1 - row).signum();

        let kind = level.tile_at(col, row);
        if kind.stops_ball() {
            return PathTrace {
                hit: Some(TileHit { kind, col, row }),
                last_free,
            };
        }
        last_free = (col, row);
    }

    PathTrace {
        hit: None,
        last_free,
    }
}
