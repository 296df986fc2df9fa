//! Fixed timestep simulation tick
//!
//! Advances paddles and ball by one step while the game is in `Playing`.

use super::controller::Direction;
use super::state::{GameEvent, GamePhase, GameState, Side};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Movement for the left and right paddle
    pub directions: [Direction; 2],
    /// Wall-clock time of the frame running this tick (ms)
    pub now_ms: f64,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    // Paddles: same handling for every controller
    let (min_y, max_y) = state.paddle_range();
    for (paddle, dir) in state.paddles.iter_mut().zip(input.directions) {
        paddle.vel = dir.sign() * PADDLE_SPEED;
        paddle.y = (paddle.y + paddle.vel * dt).clamp(min_y, max_y);
    }

    // Ball
    state.ball.pos += state.ball.vel * dt;

    // Top/bottom walls occupy row 0 and the last row
    let floor = state.height as f32 - 1.0 - BALL_SIZE;
    if state.ball.pos.y < 1.0 {
        state.ball.pos.y = 1.0;
        state.ball.vel.y = state.ball.vel.y.abs();
        state.events.push(GameEvent::WallBounce);
    } else if state.ball.pos.y > floor {
        state.ball.pos.y = floor;
        state.ball.vel.y = -state.ball.vel.y.abs();
        state.events.push(GameEvent::WallBounce);
    }

    // Paddle hits: only when moving toward the paddle, so the ball can't stick
    for i in 0..2 {
        let paddle = state.paddles[i];
        let approaching = match paddle.side {
            Side::Left => state.ball.vel.x < 0.0,
            Side::Right => state.ball.vel.x > 0.0,
        };
        if !approaching || !paddle.overlaps(&state.ball) {
            continue;
        }

        let ball = &mut state.ball;
        let speed = (ball.vel.length() * PADDLE_BOOST).min(BALL_MAX_SPEED);
        // -1 at the paddle's top edge, +1 at the bottom
        let offset = ((ball.center().y - paddle.center_y()) / (PADDLE_HEIGHT / 2.0)).clamp(-1.0, 1.0);
        let vy = offset * PADDLE_SPIN * speed;
        let vx = (speed * speed - vy * vy).max(0.0).sqrt();
        ball.vel.x = match paddle.side {
            Side::Left => vx,
            Side::Right => -vx,
        };
        ball.vel.y = vy;
        ball.pos.x = match paddle.side {
            Side::Left => paddle.x + PADDLE_WIDTH,
            Side::Right => paddle.x - BALL_SIZE,
        };
        state.events.push(GameEvent::PaddleHit(paddle.side));
    }

    // Goals once the ball is fully off screen
    if state.ball.pos.x + BALL_SIZE < 0.0 {
        state.score_goal(Side::Right, input.now_ms);
    } else if state.ball.pos.x > state.width as f32 {
        state.score_goal(Side::Left, input.now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn playing() -> GameState {
        let mut state = GameState::new(12345, 96, 64);
        state.start(0.0);
        state.update_countdown(state.countdown_ms);
        state
    }

    #[test]
    fn test_tick_only_runs_while_playing() {
        let mut state = GameState::new(12345, 96, 64);
        let before = state.ball;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.ball, before);
        assert_eq!(state.time_ticks, 0);

        state.start(0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = playing();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 1);

        state.toggle_pause(10.0);
        let frozen = state.ball;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.ball, frozen);

        state.toggle_pause(20.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_paddles_move_and_clamp() {
        let mut state = playing();
        let input = TickInput {
            directions: [Direction::Up, Direction::Down],
            now_ms: 0.0,
        };
        let start = [state.paddles[0].y, state.paddles[1].y];
        tick(&mut state, &input, SIM_DT);
        assert!(state.paddles[0].y < start[0]);
        assert!(state.paddles[1].y > start[1]);

        for _ in 0..600 {
            tick(&mut state, &input, SIM_DT);
            // keep the ball out of the way
            state.ball.pos = Vec2::new(48.0, 32.0);
        }
        let (min_y, max_y) = state.paddle_range();
        assert_eq!(state.paddles[0].y, min_y);
        assert_eq!(state.paddles[1].y, max_y);
    }

    #[test]
    fn test_wall_bounce() {
        let mut state = playing();
        state.ball.pos = Vec2::new(48.0, 1.1);
        state.ball.vel = Vec2::new(10.0, -60.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.ball.vel.y > 0.0);
        assert!(state.ball.pos.y >= 1.0);
        assert!(state.events.contains(&GameEvent::WallBounce));
    }

    #[test]
    fn test_paddle_hit_reflects_and_speeds_up() {
        let mut state = playing();
        let paddle = state.paddles[0];
        state.ball.pos = Vec2::new(paddle.x + PADDLE_WIDTH + 0.1, paddle.center_y() - BALL_SIZE / 2.0);
        state.ball.vel = Vec2::new(-40.0, 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert!(state.ball.vel.x > 0.0);
        assert!(state.ball.vel.length() > 40.0);
        assert!(state.ball.vel.length() <= BALL_MAX_SPEED + 1e-3);
        assert!(state.events.contains(&GameEvent::PaddleHit(Side::Left)));
    }

    #[test]
    fn test_edge_hit_adds_spin() {
        let mut state = playing();
        let paddle = state.paddles[1];
        state.ball.pos = Vec2::new(paddle.x - BALL_SIZE + 0.2, paddle.y - 1.0);
        state.ball.vel = Vec2::new(50.0, 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.ball.vel.x < 0.0);
        // Top edge sends it upward
        assert!(state.ball.vel.y < 0.0);
    }

    #[test]
    fn test_goal_scored_when_ball_leaves_left() {
        let mut state = playing();
        state.ball.pos = Vec2::new(-1.9, 10.0);
        state.ball.vel = Vec2::new(-40.0, 5.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.score.right, 1);
        assert_eq!(state.ball.pos, Vec2::new(48.0, 32.0));
        // Re-served toward the player who conceded
        assert!(state.ball.vel.x < 0.0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = playing();
        let mut state2 = playing();
        let inputs = [
            TickInput {
                directions: [Direction::Up, Direction::Stay],
                now_ms: 0.0,
            },
            TickInput {
                directions: [Direction::Down, Direction::Up],
                now_ms: 10.0,
            },
            TickInput::default(),
        ];
        for _ in 0..200 {
            for input in &inputs {
                tick(&mut state1, input, SIM_DT);
                tick(&mut state2, input, SIM_DT);
            }
        }
        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.ball, state2.ball);
        assert_eq!(state1.score, state2.score);
    }
}
