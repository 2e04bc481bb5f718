//! Level layout generation
//!
//! Maps a level number to a brick grid. Grid size and durability are pure
//! functions of the level; cell presence follows a level-dependent pattern or,
//! in [`LayoutStyle::Scattered`], a random omission drawn from the injected RNG.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::state::Brick;
use crate::tuning::Tuning;

/// Grid caps
pub const MIN_ROWS: u32 = 3;
pub const MAX_ROWS: u32 = 9;
pub const MIN_COLS: u32 = 6;
pub const MAX_COLS: u32 = 14;

/// Highest durability a brick can have
pub const MAX_DURABILITY: u8 = 3;

/// Scattered omission never exceeds this probability
pub const MAX_OMISSION: f64 = 0.7;

/// Levels up to this are fully filled
const FULL_GRID_MAX_LEVEL: u32 = 5;
/// Levels up to this use the diamond pattern
const DIAMOND_MAX_LEVEL: u32 = 30;
/// Levels up to this use the checkerboard pattern
const CHECKER_MAX_LEVEL: u32 = 60;

/// How brick presence is decided per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStyle {
    /// Fixed level-dependent patterns (full, diamond, checkerboard, modulo)
    #[default]
    Patterned,
    /// Random omission, more likely at higher levels
    Scattered,
}

/// Brick durability for a level: `min(3, floor(level / 3) + 1)`
pub fn durability_for_level(level: u32) -> u8 {
    (level / 3 + 1).min(MAX_DURABILITY as u32) as u8
}

/// Grid rows for a level (grows every 8 levels, capped)
pub fn rows_for_level(level: u32) -> u32 {
    (MIN_ROWS + level.saturating_sub(1) / 8).min(MAX_ROWS)
}

/// Grid columns for a level (grows every 6 levels, capped)
pub fn cols_for_level(level: u32) -> u32 {
    (MIN_COLS + level.saturating_sub(1) / 6).min(MAX_COLS)
}

/// Per-cell omission probability for scattered layouts
pub fn omission_probability(level: u32) -> f64 {
    (0.05 + 0.01 * level.saturating_sub(1) as f64).min(MAX_OMISSION)
}

/// Brick grid for one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub level: u32,
    pub rows: u32,
    pub cols: u32,
    /// Row-major cells, `Some(durability)` where a brick is present
    pub cells: Vec<Option<u8>>,
}

impl LevelLayout {
    pub fn get(&self, row: u32, col: u32) -> Option<u8> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[(row * self.cols + col) as usize]
    }

    pub fn brick_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Place the bricks on the canvas, row-major
    pub fn build_bricks(&self, tuning: &Tuning) -> Vec<Brick> {
        let cols = self.cols.max(1) as f32;
        let usable = tuning.canvas_width
            - 2.0 * tuning.brick_offset_side
            - (cols - 1.0) * tuning.brick_padding;
        let width = (usable / cols).max(1.0);

        let mut bricks = Vec::with_capacity(self.brick_count());
        for row in 0..self.rows {
            for col in 0..self.cols {
                if let Some(hits) = self.get(row, col) {
                    let x = tuning.brick_offset_side + col as f32 * (width + tuning.brick_padding);
                    let y = tuning.brick_offset_top
                        + row as f32 * (tuning.brick_height + tuning.brick_padding);
                    bricks.push(Brick::new(
                        Rect::new(x, y, width, tuning.brick_height),
                        hits,
                    ));
                }
            }
        }
        bricks
    }
}

/// Generate the layout for `level` (clamped into `[1, max_level]`)
///
/// Randomness only comes from `rng`: [`LayoutStyle::Patterned`] uses it solely
/// for the fallback brick, which it never needs in practice.
pub fn generate_layout<R: Rng + ?Sized>(
    level: u32,
    max_level: u32,
    style: LayoutStyle,
    rng: &mut R,
) -> LevelLayout {
    let level = level.clamp(1, max_level.max(1));
    let rows = rows_for_level(level);
    let cols = cols_for_level(level);
    let durability = durability_for_level(level);
    let omission = omission_probability(level);

    let mut cells = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let present = match style {
                LayoutStyle::Patterned => pattern_keeps(level, row, col, cols),
                LayoutStyle::Scattered => !rng.random_bool(omission),
            };
            cells.push(present.then_some(durability));
        }
    }

    // Never hand out an empty level
    if cells.iter().all(Option::is_none) {
        let forced = rng.random_range(0..cells.len());
        log::warn!("Level {} layout came out empty, forcing cell {}", level, forced);
        cells[forced] = Some(durability);
    }

    LevelLayout {
        level,
        rows,
        cols,
        cells,
    }
}

/// Generate with an RNG seeded from the level number alone
pub fn generate_layout_for_level(level: u32, max_level: u32, style: LayoutStyle) -> LevelLayout {
    let mut rng = Pcg32::seed_from_u64(level_seed(level));
    generate_layout(level, max_level, style, &mut rng)
}

/// Stable per-level seed
pub fn level_seed(level: u32) -> u64 {
    (level as u64).wrapping_mul(2654435761)
}

/// Patterned presence rule
fn pattern_keeps(level: u32, row: u32, col: u32, cols: u32) -> bool {
    if level <= FULL_GRID_MAX_LEVEL {
        true
    } else if level <= DIAMOND_MAX_LEVEL {
        // Skip more border cells on lower rows, always keeping the center
        let skip = (row / 2).min((cols - 1) / 2);
        col >= skip && col < cols - skip
    } else if level <= CHECKER_MAX_LEVEL {
        (row + col) % 2 == 0
    } else {
        let modulus = 3 + level % 4;
        (row * cols + col) % modulus != 0
    }
}
