//! Tile grid levels
//!
//! A level is a fixed 80x45 grid of tiles parsed from newline-delimited ASCII.
//! Parsing never fails: short input is padded with empty tiles and anything
//! past the grid is ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{GRID_COLS, GRID_ROWS};
use crate::error::{Error, Result};

/// Tile alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    /// Solid wall (`O`)
    Wall,
    /// Scores for player one (`X`)
    LeftGoal,
    /// Scores for player two (`Y`)
    RightGoal,
    /// Drawn only (`a`)
    Decor,
    /// Sends the ball back to spawn (`!`)
    Reset,
}

impl TileKind {
    /// Unknown symbols are empty
    pub fn from_symbol(c: char) -> Self {
        match c {
            'O' => TileKind::Wall,
            'X' => TileKind::LeftGoal,
            'Y' => TileKind::RightGoal,
            'a' => TileKind::Decor,
            '!' => TileKind::Reset,
            _ => TileKind::Empty,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Wall => 'O',
            TileKind::LeftGoal => 'X',
            TileKind::RightGoal => 'Y',
            TileKind::Decor => 'a',
            TileKind::Reset => '!',
        }
    }

    /// Whether a path trace ends on this tile
    pub fn stops_ball(&self) -> bool {
        matches!(
            self,
            TileKind::Wall | TileKind::LeftGoal | TileKind::RightGoal | TileKind::Reset
        )
    }
}

/// An immutable tile grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    name: String,
    /// Row-major, GRID_COLS * GRID_ROWS entries
    tiles: Vec<TileKind>,
}

impl Default for Level {
    fn default() -> Self {
        Self::empty("empty")
    }
}

impl Level {
    /// A level with nothing in it
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tiles: vec![TileKind::Empty; GRID_COLS * GRID_ROWS],
        }
    }

    /// Parse a level description, bounded to the grid
    pub fn parse(name: &str, text: &str) -> Self {
        let mut level = Self::empty(name);
        for (row, line) in text.lines().take(GRID_ROWS).enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            for (col, c) in line.chars().take(GRID_COLS).enumerate() {
                level.tiles[row * GRID_COLS + col] = TileKind::from_symbol(c);
            }
        }
        level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn in_bounds(col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < GRID_COLS && (row as usize) < GRID_ROWS
    }

    /// Tile at a cell, `Empty` outside the grid
    #[inline]
    pub fn tile_at(&self, col: i32, row: i32) -> TileKind {
        if Self::in_bounds(col, row) {
            self.tiles[row as usize * GRID_COLS + col as usize]
        } else {
            TileKind::Empty
        }
    }

    /// Place a tile (test and editor helper), ignored outside the grid
    pub fn set_tile(&mut self, col: i32, row: i32, kind: TileKind) {
        if Self::in_bounds(col, row) {
            self.tiles[row as usize * GRID_COLS + col as usize] = kind;
        }
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }

    /// Back to text, one row per line
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((GRID_COLS + 1) * GRID_ROWS);
        for row in self.tiles.chunks_exact(GRID_COLS) {
            out.extend(row.iter().map(|t| t.symbol()));
            out.push('\n');
        }
        out
    }
}

/// Where level descriptions come from
pub trait LevelSource {
    fn load(&self, name: &str) -> Result<Level>;
}

const MULTI_LEVEL: &str = include_str!("../levels/multi.lvl");
const BORDER_LEVEL: &str = include_str!("../levels/border.lvl");

/// The levels shipped with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLevels;

impl LevelSource for BuiltinLevels {
    fn load(&self, name: &str) -> Result<Level> {
        let text = match name {
            "multi" => MULTI_LEVEL,
            "border" => BORDER_LEVEL,
            _ => return Err(Error::LevelNotFound(name.to_string())),
        };
        Ok(Level::parse(name, text))
    }
}

/// Levels read from `<dir>/<name>.lvl`, falling back to the built-in set
#[derive(Debug, Clone)]
pub struct LevelDir {
    dir: PathBuf,
}

impl LevelDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.lvl", name))
    }
}

impl LevelSource for LevelDir {
    fn load(&self, name: &str) -> Result<Level> {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Loaded level {} from {}", name, path.display());
                Ok(Level::parse(name, &text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} missing, trying built-in level", path.display());
                BuiltinLevels.load(name)
            }
            Err(source) => Err(Error::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_places_tiles() {
        let level = Level::parse("t", "O.X\n.Y!\n..a\n");
        assert_eq!(level.tile_at(0, 0), TileKind::Wall);
        assert_eq!(level.tile_at(2, 0), TileKind::LeftGoal);
        assert_eq!(level.tile_at(1, 1), TileKind::RightGoal);
        assert_eq!(level.tile_at(2, 1), TileKind::Reset);
        assert_eq!(level.tile_at(2, 2), TileKind::Decor);
        assert_eq!(level.tile_at(5, 5), TileKind::Empty);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let mut level = Level::empty("t");
        level.set_tile(79, 44, TileKind::Wall);
        assert_eq!(level.tile_at(79, 44), TileKind::Wall);
        assert_eq!(level.tile_at(80, 44), TileKind::Empty);
        assert_eq!(level.tile_at(79, 45), TileKind::Empty);
        assert_eq!(level.tile_at(-1, 0), TileKind::Empty);
        assert_eq!(level.tile_at(0, i32::MIN), TileKind::Empty);
    }

    #[test]
    fn test_oversized_input_is_bounded() {
        let wide_row = "O".repeat(120);
        let text = std::iter::repeat_n(wide_row.as_str(), 60)
            .collect::<Vec<_>>()
            .join("\n");
        let level = Level::parse("big", &text);
        assert_eq!(level.count(TileKind::Wall), GRID_COLS * GRID_ROWS);
    }

    #[test]
    fn test_truncated_input_is_padded() {
        let level = Level::parse("short", "OOOO\r\nXX");
        assert_eq!(level.count(TileKind::Wall), 4);
        assert_eq!(level.count(TileKind::LeftGoal), 2);
        assert_eq!(level.tile_at(4, 0), TileKind::Empty);
        assert_eq!(level.count(TileKind::Empty), GRID_COLS * GRID_ROWS - 6);
    }

    #[test]
    fn test_text_roundtrip() {
        let level = BuiltinLevels.load("multi").unwrap();
        assert_eq!(Level::parse("multi", &level.to_text()), level);
    }

    #[test]
    fn test_builtin_levels() {
        let multi = BuiltinLevels.load("multi").unwrap();
        assert!(multi.count(TileKind::LeftGoal) > 0);
        assert!(multi.count(TileKind::RightGoal) > 0);
        assert!(multi.count(TileKind::Reset) > 0);
        // Spawn cell must be free
        assert_eq!(multi.tile_at(40, 30), TileKind::Empty);

        let border = BuiltinLevels.load("border").unwrap();
        assert_eq!(border.count(TileKind::LeftGoal), 0);
        assert_eq!(border.count(TileKind::RightGoal), 0);

        assert!(matches!(
            BuiltinLevels.load("nope"),
            Err(Error::LevelNotFound(_))
        ));
    }

    #[test]
    fn test_level_dir_falls_back_to_builtin() {
        let source = LevelDir::new("/nonexistent/levels");
        let level = source.load("border").unwrap();
        assert_eq!(level.name(), "border");
        assert!(source.load("nope").is_err());
    }
}
