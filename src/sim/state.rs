//! Game state and core simulation types
//!
//! Everything one level attempt owns lives in [`GameState`]. It is rebuilt
//! from scratch on every level start and is serializable so adapters can
//! snapshot it.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::level::{LevelLayout, generate_layout_for_level};
use crate::tuning::Tuning;

/// Brick colors (0xRRGGBB) indexed by remaining hits - 1
pub const BRICK_PALETTE: [u32; 3] = [0x4fc3f7, 0xffb74d, 0xe57373];

/// Palette color for a brick with `hits` remaining (clamped to the palette)
pub fn brick_color(hits: u8) -> u32 {
    let index = (hits.max(1) as usize - 1).min(BRICK_PALETTE.len() - 1);
    BRICK_PALETTE[index]
}

/// The player's paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    /// Top edge (fixed for the level)
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Keyboard movement per tick
    pub speed: f32,
}

impl Paddle {
    /// Centered paddle at default width
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: (tuning.canvas_width - tuning.paddle_width) / 2.0,
            y: tuning.paddle_y(),
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            speed: tuning.paddle_speed,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Move the left edge, keeping the paddle inside `[0, canvas_width]`
    pub fn set_x(&mut self, x: f32, canvas_width: f32) {
        let max_x = (canvas_width - self.width).max(0.0);
        self.x = if x.is_finite() { x.clamp(0.0, max_x) } else { self.x.clamp(0.0, max_x) };
    }

    /// Grow by `step`, capped at `max_width`, then re-clamp position
    pub fn grow(&mut self, step: f32, min_width: f32, max_width: f32, canvas_width: f32) {
        let center = self.center_x();
        self.width = (self.width + step).clamp(min_width, max_width);
        self.set_x(center - self.width / 2.0, canvas_width);
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    /// Displacement per tick
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    /// Ball at its serve position with a random horizontal direction, moving up
    pub fn served<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> Self {
        let dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            pos: Self::serve_position(tuning),
            vel: Vec2::new(dir * tuning.ball_speed, -tuning.ball_speed),
            radius: tuning.ball_radius,
        }
    }

    /// Canonical position just above the centered paddle
    pub fn serve_position(tuning: &Tuning) -> Vec2 {
        Vec2::new(
            tuning.canvas_width / 2.0,
            tuning.paddle_y() - tuning.ball_radius - 2.0,
        )
    }

    /// Reset position and speed after a lost life
    pub fn reset<R: Rng + ?Sized>(&mut self, tuning: &Tuning, rng: &mut R) {
        *self = Self::served(tuning, rng);
    }

    /// Current speed magnitude
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Multiply velocity, capping the magnitude at `max_speed`
    pub fn speed_up(&mut self, factor: f32, max_speed: f32) {
        self.vel *= factor;
        let speed = self.vel.length();
        if speed > max_speed {
            self.vel = self.vel / speed * max_speed;
        }
    }

    /// Replace a zero or non-finite velocity with the canonical one
    ///
    /// Returns true if a correction was made.
    pub fn repair_velocity(&mut self, tuning: &Tuning) -> bool {
        let healthy = self.vel.is_finite() && self.vel.length_squared() > f32::EPSILON;
        if !healthy {
            self.vel = Vec2::new(tuning.ball_speed, -tuning.ball_speed);
        }
        !healthy
    }
}

/// A brick entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub rect: Rect,
    /// Remaining hits before breaking
    pub hits: u8,
    /// Once set, never cleared for the rest of the level
    pub broken: bool,
    /// Display color, derived from `hits`
    pub color: u32,
}

impl Brick {
    pub fn new(rect: Rect, hits: u8) -> Self {
        Self {
            rect,
            hits,
            broken: hits == 0,
            color: brick_color(hits),
        }
    }

    /// Apply one hit. Returns true if this hit broke the brick.
    pub fn hit(&mut self) -> bool {
        if self.broken {
            return false;
        }
        self.hits = self.hits.saturating_sub(1);
        if self.hits == 0 {
            self.broken = true;
        } else {
            self.color = brick_color(self.hits);
        }
        self.broken
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    ExtraLife,
    PaddleGrow,
    BallSpeedUp,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::ExtraLife,
        PowerUpKind::PaddleGrow,
        PowerUpKind::BallSpeedUp,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A falling power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub rect: Rect,
    pub kind: PowerUpKind,
    /// Fall per tick
    pub fall_speed: f32,
}

impl PowerUp {
    /// Spawn centered on `center`
    pub fn new(center: Vec2, kind: PowerUpKind, tuning: &Tuning) -> Self {
        let size = tuning.power_up_size;
        Self {
            rect: Rect::new(center.x - size / 2.0, center.y - size / 2.0, size, size),
            kind,
            fall_speed: tuning.power_up_fall_speed,
        }
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Brick at `index` lost a hit but survived
    BrickHit { index: usize },
    /// Brick at `index` broke, awarding `points`
    BrickBroken { index: usize, points: u64 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    /// Ball fell out; `lives` remain and play continues
    LifeLost { lives: u8 },
    /// Last life lost
    GameOver,
    /// Every brick broken
    LevelCleared { next_level: u32 },
}

impl GameEvent {
    /// Terminal events end the running state
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::GameOver | GameEvent::LevelCleared { .. })
    }
}

/// Complete state of one level attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Level being played (1-based)
    pub level: u32,
    pub lives: u8,
    pub score: u64,
    pub paddle: Paddle,
    pub ball: Ball,
    /// Row-major brick grid; broken bricks stay in place
    pub bricks: Vec<Brick>,
    pub power_ups: Vec<PowerUp>,
    /// Simulation tick counter
    pub ticks: u64,
}

impl GameState {
    /// Fresh attempt at `level` (clamped into range)
    pub fn new<R: Rng + ?Sized>(level: u32, tuning: &Tuning, rng: &mut R) -> Self {
        let level = tuning.clamp_level(level);
        let layout = generate_layout_for_level(level, tuning.max_level, tuning.layout_style);
        Self::from_layout(&layout, tuning, rng)
    }

    /// Fresh attempt using an explicit layout
    pub fn from_layout<R: Rng + ?Sized>(layout: &LevelLayout, tuning: &Tuning, rng: &mut R) -> Self {
        Self {
            level: layout.level,
            lives: tuning.starting_lives,
            score: 0,
            paddle: Paddle::new(tuning),
            ball: Ball::served(tuning, rng),
            bricks: layout.build_bricks(tuning),
            power_ups: Vec::new(),
            ticks: 0,
        }
    }

    /// Bricks not yet broken
    pub fn remaining_bricks(&self) -> usize {
        self.bricks.iter().filter(|b| !b.broken).count()
    }

    pub fn is_cleared(&self) -> bool {
        self.bricks.iter().all(|b| b.broken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_brick_color_clamped() {
        assert_eq!(brick_color(0), BRICK_PALETTE[0]);
        assert_eq!(brick_color(1), BRICK_PALETTE[0]);
        assert_eq!(brick_color(3), BRICK_PALETTE[2]);
        assert_eq!(brick_color(9), BRICK_PALETTE[2]);
    }

    #[test]
    fn test_brick_hit_sequence() {
        let mut brick = Brick::new(Rect::new(0.0, 0.0, 50.0, 20.0), 2);
        assert_eq!(brick.color, BRICK_PALETTE[1]);

        assert!(!brick.hit());
        assert_eq!(brick.hits, 1);
        assert_eq!(brick.color, BRICK_PALETTE[0]);

        assert!(brick.hit());
        assert!(brick.broken);

        // Broken bricks ignore further hits
        assert!(!brick.hit());
        assert!(brick.broken);
        assert_eq!(brick.hits, 0);
    }

    #[test]
    fn test_paddle_clamped() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        paddle.set_x(-50.0, tuning.canvas_width);
        assert_eq!(paddle.x, 0.0);
        paddle.set_x(10_000.0, tuning.canvas_width);
        assert_eq!(paddle.x, tuning.canvas_width - paddle.width);
        paddle.set_x(f32::NAN, tuning.canvas_width);
        assert_eq!(paddle.x, tuning.canvas_width - paddle.width);
    }

    #[test]
    fn test_paddle_grow_capped_and_in_bounds() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        paddle.set_x(tuning.canvas_width, tuning.canvas_width);
        for _ in 0..20 {
            paddle.grow(
                tuning.paddle_grow_step,
                tuning.paddle_min_width,
                tuning.paddle_max_width,
                tuning.canvas_width,
            );
        }
        assert_eq!(paddle.width, tuning.paddle_max_width);
        assert!(paddle.x + paddle.width <= tuning.canvas_width);
    }

    #[test]
    fn test_ball_speed_up_capped() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ball = Ball::served(&tuning, &mut rng);
        for _ in 0..50 {
            ball.speed_up(tuning.ball_speed_up, tuning.ball_max_speed);
        }
        assert!((ball.speed() - tuning.ball_max_speed).abs() < 1e-3);
    }

    #[test]
    fn test_served_ball_moves_up() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..10 {
            let ball = Ball::served(&tuning, &mut rng);
            assert!(ball.vel.y < 0.0);
            assert_eq!(ball.vel.x.abs(), tuning.ball_speed);
        }
    }

    #[test]
    fn test_repair_velocity() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut ball = Ball::served(&tuning, &mut rng);
        assert!(!ball.repair_velocity(&tuning));

        ball.vel = Vec2::ZERO;
        assert!(ball.repair_velocity(&tuning));
        assert!(ball.speed() > 0.0);

        ball.vel = Vec2::new(f32::NAN, 1.0);
        assert!(ball.repair_velocity(&tuning));
        assert!(ball.vel.is_finite());
    }

    #[test]
    fn test_new_state_defaults() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let state = GameState::new(0, &tuning, &mut rng);
        assert_eq!(state.level, 1);
        assert_eq!(state.lives, tuning.starting_lives);
        assert_eq!(state.score, 0);
        assert!(state.remaining_bricks() > 0);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_new_state_with_zero_max_level() {
        let tuning = Tuning {
            max_level: 0,
            ..Tuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let state = GameState::new(5, &tuning, &mut rng);
        assert_eq!(state.level, 1);
        assert!(state.remaining_bricks() > 0);
    }
}
