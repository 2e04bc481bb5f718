//! Data-driven game balance
//!
//! [`Tuning`] mirrors every constant in [`crate::consts`]. A JSON document can
//! override any subset of fields; missing keys fall back to the compile-time
//! defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::BrickfallError;
use crate::sim::LayoutStyle;

/// Runtime-tunable gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // Progression
    pub max_level: u32,
    pub starting_lives: u8,
    pub max_lives: u8,
    pub layout_style: LayoutStyle,

    // Canvas
    pub canvas_width: f32,
    pub canvas_height: f32,

    // Paddle
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_bottom_gap: f32,
    pub paddle_speed: f32,
    pub paddle_min_width: f32,
    pub paddle_max_width: f32,
    pub paddle_grow_step: f32,

    // Ball
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub ball_speed_up: f32,
    pub ball_max_speed: f32,

    // Bricks
    pub brick_height: f32,
    pub brick_padding: f32,
    pub brick_offset_top: f32,
    pub brick_offset_side: f32,
    pub brick_points: u64,

    // Power-ups
    pub power_up_chance: f64,
    pub power_up_size: f32,
    pub power_up_fall_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            starting_lives: STARTING_LIVES,
            max_lives: MAX_LIVES,
            layout_style: LayoutStyle::default(),

            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_bottom_gap: PADDLE_BOTTOM_GAP,
            paddle_speed: PADDLE_SPEED,
            paddle_min_width: PADDLE_MIN_WIDTH,
            paddle_max_width: PADDLE_MAX_WIDTH,
            paddle_grow_step: PADDLE_GROW_STEP,

            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            ball_speed_up: BALL_SPEED_UP,
            ball_max_speed: BALL_MAX_SPEED,

            brick_height: BRICK_HEIGHT,
            brick_padding: BRICK_PADDING,
            brick_offset_top: BRICK_OFFSET_TOP,
            brick_offset_side: BRICK_OFFSET_SIDE,
            brick_points: BRICK_POINTS,

            power_up_chance: POWER_UP_CHANCE,
            power_up_size: POWER_UP_SIZE,
            power_up_fall_speed: POWER_UP_FALL_SPEED,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, BrickfallError> {
        let tuning: Tuning = serde_json::from_str(json).map_err(BrickfallError::InvalidTuning)?;
        Ok(tuning.sanitized())
    }

    /// Parse JSON, logging and falling back to defaults on error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("{}; using default tuning", e);
                Self::default()
            }
        }
    }

    /// Clamp values that would break simulation invariants
    pub fn sanitized(mut self) -> Self {
        self.max_level = self.max_level.max(1);
        self.starting_lives = self.starting_lives.max(1);
        self.max_lives = self.max_lives.max(self.starting_lives);
        self.paddle_min_width = self.paddle_min_width.max(1.0).min(self.canvas_width);
        self.paddle_max_width = self
            .paddle_max_width
            .clamp(self.paddle_min_width, self.canvas_width);
        self.paddle_width = self
            .paddle_width
            .clamp(self.paddle_min_width, self.paddle_max_width);
        self.ball_radius = self.ball_radius.max(1.0);
        if self.ball_speed <= 0.0 || !self.ball_speed.is_finite() {
            self.ball_speed = BALL_SPEED;
        }
        self.ball_max_speed = self.ball_max_speed.max(self.ball_speed * std::f32::consts::SQRT_2);
        self.ball_speed_up = self.ball_speed_up.max(1.0);
        self.power_up_chance = self.power_up_chance.clamp(0.0, 1.0);
        self
    }

    /// Paddle top edge (fixed for the whole level)
    pub fn paddle_y(&self) -> f32 {
        self.canvas_height - self.paddle_bottom_gap - self.paddle_height
    }

    /// Clamp a requested level into `[1, max_level]`
    pub fn clamp_level(&self, level: u32) -> u32 {
        level.clamp(1, self.max_level.max(1))
    }
}
