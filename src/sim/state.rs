//! Game state and core simulation types
//!
//! Phase transitions live here; per-tick physics lives in `tick`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::controller::Difficulty;
use crate::consts::*;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, choosing mode and difficulty
    Menu,
    /// 3-2-1 before the serve
    Countdown,
    /// Active gameplay; the only phase the simulation advances in
    Playing,
    /// Game is paused
    Paused,
    /// Someone reached the win score
    GameOver,
}

/// Who controls which paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Keyboard (left) vs AI (right)
    #[default]
    OnePlayer,
    /// Split keyboard
    TwoPlayer,
    /// AI vs AI, used by the headless runner
    Attract,
}

impl GameMode {
    /// Next entry in the menu list (attract mode is not listed)
    pub fn toggled(self) -> Self {
        match self {
            GameMode::OnePlayer => GameMode::TwoPlayer,
            GameMode::TwoPlayer | GameMode::Attract => GameMode::OnePlayer,
        }
    }
}

/// Court side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

/// The ball; `pos` is its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Ball {
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(BALL_SIZE / 2.0)
    }
}

/// A paddle; `y` is its top edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub side: Side,
    pub x: f32,
    pub y: f32,
    /// Vertical velocity set from the controller's direction each tick
    pub vel: f32,
}

impl Paddle {
    pub fn new(side: Side, court_width: u32, court_height: u32) -> Self {
        let x = match side {
            Side::Left => PADDLE_MARGIN,
            Side::Right => court_width as f32 - PADDLE_MARGIN - PADDLE_WIDTH,
        };
        Self {
            side,
            x,
            y: ((court_height as f32 - PADDLE_HEIGHT) / 2.0).floor(),
            vel: 0.0,
        }
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + PADDLE_HEIGHT / 2.0
    }

    /// Axis-aligned overlap with the ball
    pub fn overlaps(&self, ball: &Ball) -> bool {
        ball.pos.x < self.x + PADDLE_WIDTH
            && ball.pos.x + BALL_SIZE > self.x
            && ball.pos.y < self.y + PADDLE_HEIGHT
            && ball.pos.y + BALL_SIZE > self.y
    }
}

/// Points per side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn bump(&mut self, side: Side) -> u32 {
        let s = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *s += 1;
        *s
    }
}

/// Ball, paddles and score captured when pausing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSnapshot {
    pub ball: Ball,
    pub paddles: [Paddle; 2],
    pub score: Score,
}

/// Entity positions for render interpolation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EntitySnapshot {
    pub ball: Vec2,
    pub paddle_y: [f32; 2],
}

impl EntitySnapshot {
    /// Blend from `prev` toward `self` by `alpha` in [0, 1]
    pub fn lerp_from(&self, prev: &EntitySnapshot, alpha: f32) -> EntitySnapshot {
        let a = alpha.clamp(0.0, 1.0);
        EntitySnapshot {
            ball: prev.ball.lerp(self.ball, a),
            paddle_y: [
                prev.paddle_y[0] + (self.paddle_y[0] - prev.paddle_y[0]) * a,
                prev.paddle_y[1] + (self.paddle_y[1] - prev.paddle_y[1]) * a,
            ],
        }
    }
}

/// Things the frame driver reacts to (logging, display clears)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Goal { scorer: Side, score: Score },
    PaddleHit(Side),
    WallBounce,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub width: u32,
    pub height: u32,
    pub phase: GamePhase,
    /// When the current phase was entered (ms)
    pub phase_started_at: f64,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub win_score: u32,
    pub countdown_ms: f64,
    pub ball: Ball,
    /// Left paddle first
    pub paddles: [Paddle; 2],
    pub score: Score,
    pub winner: Option<Side>,
    pub pause_snapshot: Option<PauseSnapshot>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New game sitting on the menu
    pub fn new(seed: u64, width: u32, height: u32) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            width,
            height,
            phase: GamePhase::Menu,
            phase_started_at: 0.0,
            mode: GameMode::default(),
            difficulty: Difficulty::default(),
            win_score: WIN_SCORE,
            countdown_ms: COUNTDOWN_MS,
            ball: Ball::default(),
            paddles: [
                Paddle::new(Side::Left, width, height),
                Paddle::new(Side::Right, width, height),
            ],
            score: Score::default(),
            winner: None,
            pause_snapshot: None,
            time_ticks: 0,
            events: Vec::new(),
        };
        let toward = if state.rng.random::<bool>() { Side::Left } else { Side::Right };
        state.reset_ball(toward);
        state
    }

    fn set_phase(&mut self, to: GamePhase, now: f64) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        self.phase_started_at = now;
        log::info!("Phase {:?} -> {:?}", from, to);
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Take the queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Menu -> Countdown with a fresh score and serve
    pub fn start(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::Menu {
            return false;
        }
        self.score = Score::default();
        self.winner = None;
        self.pause_snapshot = None;
        self.time_ticks = 0;
        self.paddles = [
            Paddle::new(Side::Left, self.width, self.height),
            Paddle::new(Side::Right, self.width, self.height),
        ];
        let toward = if self.rng.random::<bool>() { Side::Left } else { Side::Right };
        self.reset_ball(toward);
        self.set_phase(GamePhase::Countdown, now);
        true
    }

    /// Countdown -> Playing once the countdown has run out
    pub fn update_countdown(&mut self, now: f64) {
        if self.phase == GamePhase::Countdown && now - self.phase_started_at >= self.countdown_ms {
            self.set_phase(GamePhase::Playing, now);
        }
    }

    /// Whole seconds left on the countdown, rounded up (3, 2, 1)
    pub fn countdown_remaining(&self, now: f64) -> u32 {
        let left = (self.countdown_ms - (now - self.phase_started_at)).max(0.0);
        (left / 1000.0).ceil() as u32
    }

    /// Playing <-> Paused; returns whether anything changed
    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.phase {
            GamePhase::Playing => {
                self.pause_snapshot = Some(PauseSnapshot {
                    ball: self.ball,
                    paddles: self.paddles,
                    score: self.score,
                });
                self.set_phase(GamePhase::Paused, now);
                true
            }
            GamePhase::Paused => {
                if let Some(snap) = self.pause_snapshot.take() {
                    self.ball = snap.ball;
                    self.paddles = snap.paddles;
                    self.score = snap.score;
                }
                self.set_phase(GamePhase::Playing, now);
                true
            }
            _ => false,
        }
    }

    /// GameOver -> Menu
    pub fn restart(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        self.set_phase(GamePhase::Menu, now);
        true
    }

    /// Record a point; ends the game at the win score, otherwise re-serves
    pub fn score_goal(&mut self, scorer: Side, now: f64) {
        let points = self.score.bump(scorer);
        log::info!(
            "Goal {}: {} - {}",
            scorer.as_str(),
            self.score.left,
            self.score.right
        );
        self.events.push(GameEvent::Goal {
            scorer,
            score: self.score,
        });
        if points >= self.win_score {
            self.winner = Some(scorer);
            log::info!("{} wins", scorer.as_str());
            self.set_phase(GamePhase::GameOver, now);
        } else {
            self.reset_ball(scorer.opposite());
        }
    }

    /// Put the ball in the centre, served toward `toward`
    ///
    /// Both velocity components are always nonzero.
    pub fn reset_ball(&mut self, toward: Side) {
        let angle = self.rng.random_range(SERVE_ANGLE_MIN..SERVE_ANGLE_MAX);
        let dir_x = match toward {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };
        let dir_y = if self.rng.random::<bool>() { 1.0 } else { -1.0 };
        self.ball = Ball {
            pos: Vec2::new((self.width / 2) as f32, (self.height / 2) as f32),
            vel: Vec2::new(
                dir_x * BALL_START_SPEED * angle.cos(),
                dir_y * BALL_START_SPEED * angle.sin(),
            ),
        };
    }

    /// Current entity positions
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            ball: self.ball.pos,
            paddle_y: [self.paddles[0].y, self.paddles[1].y],
        }
    }

    /// Lowest and highest paddle top inside the walls
    pub fn paddle_range(&self) -> (f32, f32) {
        (1.0, (self.height as f32 - 1.0 - PADDLE_HEIGHT).max(1.0))
    }
}
