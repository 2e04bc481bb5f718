//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed per-tick step only
//! - Randomness only through an injected RNG
//! - Stable iteration order (row-major bricks)
//! - No rendering, storage or platform dependencies

pub mod geometry;
pub mod level;
pub mod state;
pub mod tick;

pub use geometry::{Rect, circle_intersects_rect, rects_overlap};
pub use level::{
    LayoutStyle, LevelLayout, durability_for_level, generate_layout, generate_layout_for_level,
};
pub use state::{
    BRICK_PALETTE, Ball, Brick, GameEvent, GameState, Paddle, PowerUp, PowerUpKind, brick_color,
};
pub use tick::{PaddleIntent, TickInput, autopilot, tick};
