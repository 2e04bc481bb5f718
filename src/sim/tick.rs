//! Fixed per-tick simulation step
//!
//! Advances one level attempt by exactly one tick. Velocities are in pixels
//! per tick; there is no sub-stepping, so a fast enough ball can tunnel through
//! a brick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{circle_intersects_rect, rects_overlap};
use super::state::{Ball, GameEvent, GameState, Paddle, PowerUp, PowerUpKind};
use crate::tuning::Tuning;

/// Paddle movement request for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaddleIntent {
    /// No input this tick, paddle stays put
    #[default]
    Hold,
    /// Center the paddle on this x (pointer/touch)
    MoveTo(f32),
    /// Keyboard left, one paddle speed step
    Left,
    /// Keyboard right, one paddle speed step
    Right,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub paddle: PaddleIntent,
}

/// Advance the game state by one tick
///
/// Returns everything that happened, in order. At most one terminal event
/// ([`GameEvent::GameOver`] or [`GameEvent::LevelCleared`]) is reported and,
/// if present, it is last.
pub fn tick<R: Rng + ?Sized>(
    state: &mut GameState,
    input: &TickInput,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.ticks += 1;

    apply_paddle_intent(&mut state.paddle, input.paddle, tuning);

    if state.ball.repair_velocity(tuning) {
        log::warn!("Ball had degenerate velocity at tick {}, reset", state.ticks);
    }
    state.ball.pos += state.ball.vel;

    resolve_walls(&mut state.ball, tuning);
    resolve_paddle(&mut state.ball, &state.paddle);
    resolve_bricks(state, tuning, rng, &mut events);
    update_power_ups(state, tuning, &mut events);

    // Bottom edge is the loss line, not a wall
    if state.ball.pos.y + state.ball.radius > tuning.canvas_height {
        state.lives = state.lives.saturating_sub(1);
        if state.lives == 0 {
            log::info!("Game over on level {} (score {})", state.level, state.score);
            events.push(GameEvent::GameOver);
            return events;
        }
        state.ball.reset(tuning, rng);
        log::debug!("Life lost on level {}, {} left", state.level, state.lives);
        events.push(GameEvent::LifeLost { lives: state.lives });
    }

    if state.is_cleared() {
        let next_level = (state.level + 1).min(tuning.max_level);
        log::info!("Level {} cleared (score {})", state.level, state.score);
        events.push(GameEvent::LevelCleared { next_level });
    }

    events
}

fn apply_paddle_intent(paddle: &mut Paddle, intent: PaddleIntent, tuning: &Tuning) {
    let x = match intent {
        PaddleIntent::Hold => paddle.x,
        PaddleIntent::MoveTo(center) => center - paddle.width / 2.0,
        PaddleIntent::Left => paddle.x - paddle.speed,
        PaddleIntent::Right => paddle.x + paddle.speed,
    };
    paddle.set_x(x, tuning.canvas_width);
}

/// Reflect off left, right and top edges, pushing the ball back inside
fn resolve_walls(ball: &mut Ball, tuning: &Tuning) {
    let r = ball.radius;
    if ball.pos.x - r < 0.0 {
        ball.pos.x = r;
        ball.vel.x = ball.vel.x.abs();
    } else if ball.pos.x + r > tuning.canvas_width {
        ball.pos.x = tuning.canvas_width - r;
        ball.vel.x = -ball.vel.x.abs();
    }
    if ball.pos.y - r < 0.0 {
        ball.pos.y = r;
        ball.vel.y = ball.vel.y.abs();
    }
}

/// Bounce up off the paddle; only a descending ball can bounce
fn resolve_paddle(ball: &mut Ball, paddle: &Paddle) {
    if ball.vel.y > 0.0 && circle_intersects_rect(ball.pos, ball.radius, &paddle.rect()) {
        ball.vel.y = -ball.vel.y;
        ball.pos.y = paddle.y - ball.radius;
    }
}

/// Hit the first overlapping brick in row-major order
fn resolve_bricks<R: Rng + ?Sized>(
    state: &mut GameState,
    tuning: &Tuning,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) {
    let ball = &state.ball;
    let Some(index) = state
        .bricks
        .iter()
        .position(|b| !b.broken && circle_intersects_rect(ball.pos, ball.radius, &b.rect))
    else {
        return;
    };

    let brick = &mut state.bricks[index];
    let center = brick.rect.center();
    if brick.hit() {
        state.score += tuning.brick_points;
        events.push(GameEvent::BrickBroken {
            index,
            points: tuning.brick_points,
        });
        if rng.random_bool(tuning.power_up_chance) {
            let kind = PowerUpKind::random(rng);
            state.power_ups.push(PowerUp::new(center, kind, tuning));
            log::debug!("Spawned {:?} at ({:.0}, {:.0})", kind, center.x, center.y);
            events.push(GameEvent::PowerUpSpawned { kind });
        }
    } else {
        events.push(GameEvent::BrickHit { index });
    }
    state.ball.vel.y = -state.ball.vel.y;
}

/// Drop power-ups, collect on paddle contact, discard below the canvas
fn update_power_ups(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    if state.power_ups.is_empty() {
        return;
    }

    let paddle_rect = state.paddle.rect();
    let mut collected: Vec<PowerUpKind> = Vec::new();
    state.power_ups.retain_mut(|p| {
        p.rect.pos.y += p.fall_speed;
        if rects_overlap(&p.rect, &paddle_rect) {
            collected.push(p.kind);
            false
        } else {
            p.rect.pos.y <= tuning.canvas_height
        }
    });

    for kind in collected {
        apply_power_up(state, kind, tuning);
        events.push(GameEvent::PowerUpCollected { kind });
    }
}

fn apply_power_up(state: &mut GameState, kind: PowerUpKind, tuning: &Tuning) {
    match kind {
        PowerUpKind::ExtraLife => {
            state.lives = state.lives.saturating_add(1).min(tuning.max_lives);
        }
        PowerUpKind::PaddleGrow => {
            state.paddle.grow(
                tuning.paddle_grow_step,
                tuning.paddle_min_width,
                tuning.paddle_max_width,
                tuning.canvas_width,
            );
        }
        PowerUpKind::BallSpeedUp => {
            state.ball.speed_up(tuning.ball_speed_up, tuning.ball_max_speed);
        }
    }
    log::debug!("Collected {:?}", kind);
}

/// Demo player: chase falling power-ups while the ball climbs, else track it
pub fn autopilot(state: &GameState) -> PaddleIntent {
    let ball = &state.ball;
    if ball.vel.y < 0.0 {
        let lowest = state
            .power_ups
            .iter()
            .max_by(|a, b| a.rect.pos.y.total_cmp(&b.rect.pos.y));
        if let Some(power_up) = lowest {
            return PaddleIntent::MoveTo(power_up.rect.center().x);
        }
    }
    // Small drift so the rally doesn't settle into a fixed loop
    let drift = (state.ticks as f32 * 0.013).sin() * state.paddle.width * 0.3;
    PaddleIntent::MoveTo(ball.pos.x + drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Brick, Rect};
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(level: u32) -> (GameState, Tuning, Pcg32) {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(12345);
        let state = GameState::new(level, &tuning, &mut rng);
        (state, tuning, rng)
    }

    /// Park the ball mid-canvas, clear of bricks and paddle
    fn park_ball(state: &mut GameState, pos: Vec2, vel: Vec2) {
        state.ball.pos = pos;
        state.ball.vel = vel;
    }

    #[test]
    fn test_right_wall_reflection() {
        let (mut state, tuning, mut rng) = setup(1);
        let r = state.ball.radius;
        park_ball(&mut state, Vec2::new(tuning.canvas_width - r, 300.0), Vec2::new(4.0, -4.0));

        tick(&mut state, &TickInput::default(), &tuning, &mut rng);

        assert!(state.ball.vel.x < 0.0);
        assert_eq!(state.ball.vel.x.abs(), 4.0);
        assert!(state.ball.pos.x + r <= tuning.canvas_width);
        assert!(state.ball.pos.x - r >= 0.0);
    }

    #[test]
    fn test_left_and_top_walls() {
        let (mut state, tuning, mut rng) = setup(1);
        let r = state.ball.radius;
        park_ball(&mut state, Vec2::new(r + 1.0, 300.0), Vec2::new(-4.0, 4.0));
        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.ball.vel.x, 4.0);
        assert!(state.ball.pos.x >= r);

        // Top wall, left of the brick grid's first column
        park_ball(&mut state, Vec2::new(15.0, r + 1.0), Vec2::new(4.0, -4.0));
        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.ball.vel.y, 4.0);
        assert!(state.ball.pos.y >= r);
    }

    #[test]
    fn test_paddle_bounce_only_when_descending() {
        let (mut state, tuning, mut rng) = setup(1);
        let paddle_center = state.paddle.center_x();
        let paddle_y = state.paddle.y;
        let r = state.ball.radius;

        park_ball(
            &mut state,
            Vec2::new(paddle_center, paddle_y - r - 2.0),
            Vec2::new(4.0, 4.0),
        );
        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.ball.vel.y, -4.0);
        assert!(state.ball.pos.y + r <= state.paddle.y);

        // Already moving up inside the paddle band: no second bounce
        park_ball(
            &mut state,
            Vec2::new(paddle_center, paddle_y + 2.0),
            Vec2::new(4.0, -4.0),
        );
        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.ball.vel.y, -4.0);
    }

    #[test]
    fn test_brick_removal() {
        let (mut state, tuning, mut rng) = setup(1);
        let target = state.bricks[0].rect.center();
        park_ball(&mut state, target, Vec2::new(4.0, -4.0));

        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);

        assert!(state.bricks[0].broken);
        assert_eq!(state.ball.vel.y, 4.0);
        assert_eq!(state.score, tuning.brick_points);
        assert!(events.contains(&GameEvent::BrickBroken {
            index: 0,
            points: tuning.brick_points
        }));
        // Neighbours untouched
        assert!(state.bricks[1..].iter().all(|b| !b.broken));
    }

    #[test]
    fn test_durable_brick_changes_color() {
        let (mut state, tuning, mut rng) = setup(6);
        assert_eq!(state.bricks[0].hits, 3);
        let before = state.bricks[0].color;
        let target = state.bricks[0].rect.center();
        park_ball(&mut state, target, Vec2::new(4.0, -4.0));

        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);

        assert_eq!(events, vec![GameEvent::BrickHit { index: 0 }]);
        assert!(!state.bricks[0].broken);
        assert_eq!(state.bricks[0].hits, 2);
        assert_ne!(state.bricks[0].color, before);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_broken_bricks_ignored() {
        let (mut state, tuning, mut rng) = setup(1);
        state.bricks[0].broken = true;
        let target = state.bricks[0].rect.center();
        park_ball(&mut state, target, Vec2::new(0.0, -4.0));

        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.ball.vel.y, -4.0);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_level_cleared() {
        let (mut state, tuning, mut rng) = setup(7);
        for brick in &mut state.bricks {
            brick.broken = true;
        }
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(4.0, -4.0));
        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(events.last(), Some(&GameEvent::LevelCleared { next_level: 8 }));
    }

    #[test]
    fn test_last_level_clear_does_not_overflow() {
        let (mut state, tuning, mut rng) = setup(tuning_max());
        for brick in &mut state.bricks {
            brick.broken = true;
        }
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(4.0, -4.0));
        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(
            events.last(),
            Some(&GameEvent::LevelCleared {
                next_level: tuning.max_level
            })
        );
    }

    fn tuning_max() -> u32 {
        Tuning::default().max_level
    }

    #[test]
    fn test_last_life_is_game_over() {
        let (mut state, tuning, mut rng) = setup(1);
        state.lives = 1;
        // Far from the paddle, about to drop out
        park_ball(
            &mut state,
            Vec2::new(20.0, tuning.canvas_height - 10.0),
            Vec2::new(4.0, 4.0),
        );
        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(events, vec![GameEvent::GameOver]);
        assert_eq!(state.lives, 0);
    }

    #[test]
    fn test_life_lost_resets_ball() {
        let (mut state, tuning, mut rng) = setup(1);
        park_ball(
            &mut state,
            Vec2::new(20.0, tuning.canvas_height - 10.0),
            Vec2::new(9.0, 9.0),
        );
        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(events, vec![GameEvent::LifeLost { lives: 2 }]);
        assert_eq!(state.ball.pos, Ball::serve_position(&tuning));
        assert!(state.ball.vel.y < 0.0);
        assert_eq!(state.ball.vel.x.abs(), tuning.ball_speed);
    }

    #[test]
    fn test_single_terminal_event() {
        let (mut state, tuning, mut rng) = setup(1);
        state.lives = 1;
        for brick in &mut state.bricks {
            brick.broken = true;
        }
        park_ball(
            &mut state,
            Vec2::new(20.0, tuning.canvas_height - 10.0),
            Vec2::new(4.0, 4.0),
        );
        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(events, vec![GameEvent::GameOver]);
    }

    #[test]
    fn test_paddle_intents() {
        let (mut state, tuning, mut rng) = setup(1);
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(4.0, -4.0));
        let start = state.paddle.x;

        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.paddle.x, start);

        let left = TickInput {
            paddle: PaddleIntent::Left,
        };
        tick(&mut state, &left, &tuning, &mut rng);
        assert_eq!(state.paddle.x, start - tuning.paddle_speed);

        let far_right = TickInput {
            paddle: PaddleIntent::MoveTo(10_000.0),
        };
        tick(&mut state, &far_right, &tuning, &mut rng);
        assert_eq!(state.paddle.x, tuning.canvas_width - state.paddle.width);

        let centered = TickInput {
            paddle: PaddleIntent::MoveTo(200.0),
        };
        tick(&mut state, &centered, &tuning, &mut rng);
        assert_eq!(state.paddle.center_x(), 200.0);
    }

    #[test]
    fn test_zero_velocity_repaired() {
        let (mut state, tuning, mut rng) = setup(1);
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::ZERO);
        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert!(state.ball.speed() > 0.0);
        assert_ne!(state.ball.pos, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_power_up_spawn_and_collect() {
        let tuning = Tuning {
            power_up_chance: 1.0,
            ..Tuning::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let mut state = GameState::new(1, &tuning, &mut rng);
        let target = state.bricks[0].rect.center();
        park_ball(&mut state, target, Vec2::new(4.0, -4.0));

        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert_eq!(state.power_ups.len(), 1);
        assert!(matches!(events.last(), Some(GameEvent::PowerUpSpawned { .. })));

        // Drop it right onto the paddle
        let kind = state.power_ups[0].kind;
        let paddle = state.paddle.clone();
        state.power_ups[0].rect.pos = Vec2::new(paddle.center_x() - 5.0, paddle.y - 5.0);
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(4.0, -4.0));
        let lives = state.lives;

        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert!(state.power_ups.is_empty());
        assert!(events.contains(&GameEvent::PowerUpCollected { kind }));
        match kind {
            PowerUpKind::ExtraLife => assert_eq!(state.lives, lives + 1),
            PowerUpKind::PaddleGrow => {
                assert_eq!(state.paddle.width, paddle.width + tuning.paddle_grow_step)
            }
            PowerUpKind::BallSpeedUp => {
                assert!((state.ball.vel.x.abs() - 4.0 * tuning.ball_speed_up).abs() < 1e-4)
            }
        }
    }

    #[test]
    fn test_extra_life_capped() {
        let (mut state, tuning, _) = setup(1);
        state.lives = tuning.max_lives;
        apply_power_up(&mut state, PowerUpKind::ExtraLife, &tuning);
        assert_eq!(state.lives, tuning.max_lives);
    }

    #[test]
    fn test_missed_power_up_discarded() {
        let (mut state, tuning, mut rng) = setup(1);
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(4.0, -4.0));
        let mut power_up = PowerUp::new(Vec2::new(20.0, 0.0), PowerUpKind::ExtraLife, &tuning);
        power_up.rect.pos.y = tuning.canvas_height - 1.0;
        state.power_ups.push(power_up);
        let lives = state.lives;

        let events = tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert!(state.power_ups.is_empty());
        assert_eq!(state.lives, lives);
        assert!(events.is_empty());
    }

    #[test]
    fn test_single_brick_scan_per_tick() {
        let (mut state, tuning, mut rng) = setup(1);
        // Two overlapping bricks at the same spot: only the first is hit
        let rect = Rect::new(380.0, 280.0, 40.0, 40.0);
        state.bricks = vec![Brick::new(rect, 1), Brick::new(rect, 1)];
        park_ball(&mut state, Vec2::new(400.0, 300.0), Vec2::new(1.0, -1.0));

        tick(&mut state, &TickInput::default(), &tuning, &mut rng);
        assert!(state.bricks[0].broken);
        assert!(!state.bricks[1].broken);
    }

    #[test]
    fn test_autopilot_tracks_ball() {
        let (mut state, _, _) = setup(1);
        park_ball(&mut state, Vec2::new(123.0, 400.0), Vec2::new(4.0, 4.0));
        match autopilot(&state) {
            PaddleIntent::MoveTo(x) => assert!((x - 123.0).abs() <= state.paddle.width * 0.3),
            other => panic!("unexpected intent {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_ball_stays_inside_horizontally(
            x in 8.0f32..792.0,
            dx in -9.0f32..9.0,
        ) {
            let (mut state, tuning, mut rng) = setup(1);
            let dy = -4.0;
            park_ball(&mut state, Vec2::new(x, 350.0), Vec2::new(dx, dy));
            tick(&mut state, &TickInput::default(), &tuning, &mut rng);
            let r = state.ball.radius;
            prop_assert!(state.ball.pos.x - r >= 0.0);
            prop_assert!(state.ball.pos.x + r <= tuning.canvas_width);
            prop_assert!((state.ball.vel.x.abs() - dx.abs()).abs() < 1e-5);
        }
    }
}
