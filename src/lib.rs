//! Brickfall - A 100-level brick breaker
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level generation, physics, game state)
//! - `session`: Level attempt state machine (setup, running, cleared, game over)
//! - `progress`: Per-player unlocked level on a local key-value store
//! - `input`: Latched paddle intent from pointer/touch/keyboard
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod error;
pub mod input;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::BrickfallError;
pub use progress::{KeyValueStore, LevelStatus, MemoryStore, ProgressStore, UserProgress};
pub use session::{MenuChoice, Phase, Session};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
///
/// Defaults for [`Tuning`]. Velocities are in pixels per tick.
pub mod consts {
    /// Number of selectable levels
    pub const MAX_LEVEL: u32 = 100;
    /// Lives at the start of every level attempt
    pub const STARTING_LIVES: u8 = 3;
    /// Upper bound on lives from extra-life pickups
    pub const MAX_LIVES: u8 = 5;

    /// Canvas dimensions
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    /// Gap between paddle bottom and canvas bottom
    pub const PADDLE_BOTTOM_GAP: f32 = 20.0;
    pub const PADDLE_SPEED: f32 = 8.0;
    pub const PADDLE_MIN_WIDTH: f32 = 60.0;
    pub const PADDLE_MAX_WIDTH: f32 = 200.0;
    /// Width added per paddle-grow pickup
    pub const PADDLE_GROW_STEP: f32 = 25.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Per-axis speed of a freshly served ball
    pub const BALL_SPEED: f32 = 4.0;
    /// Speed multiplier per ball-speed pickup
    pub const BALL_SPEED_UP: f32 = 1.2;
    /// Cap on ball speed magnitude
    pub const BALL_MAX_SPEED: f32 = 10.0;

    /// Brick grid layout
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_PADDING: f32 = 8.0;
    pub const BRICK_OFFSET_TOP: f32 = 50.0;
    pub const BRICK_OFFSET_SIDE: f32 = 30.0;
    /// Points per broken brick
    pub const BRICK_POINTS: u64 = 10;

    /// Power-ups
    pub const POWER_UP_CHANCE: f64 = 0.2;
    pub const POWER_UP_SIZE: f32 = 18.0;
    pub const POWER_UP_FALL_SPEED: f32 = 2.5;

    /// Version marker written to the key-value store
    pub const GAME_VERSION: &str = "1.0";
}
