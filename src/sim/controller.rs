//! Paddle controllers
//!
//! Every controller answers the same question each tick: which way should
//! this paddle move? Keyboard and AI controllers return a `Direction` and
//! the tick applies it the same way for both.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Ball, Paddle, Side};
use crate::consts::*;

/// Vertical movement request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Stay,
}

impl Direction {
    /// -1 (up, toward row 0), 0 or +1
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up => -1.0,
            Direction::Down => 1.0,
            Direction::Stay => 0.0,
        }
    }
}

/// Active degauss run as seen by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegaussWindow {
    pub start_ms: f64,
    pub duration_ms: f64,
}

/// Read-only context handed to controllers each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimContext {
    pub now_ms: f64,
    pub court_width: u32,
    pub court_height: u32,
    pub degauss: Option<DegaussWindow>,
}

/// Something that steers a paddle
pub trait PaddleController {
    fn decide(&mut self, paddle: &Paddle, ball: &Ball, ctx: &SimContext) -> Direction;
}

/// Logical key names bound to up and down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl KeySet {
    fn from_names(up: &[&str], down: &[&str]) -> Self {
        Self {
            up: up.iter().map(|s| s.to_string()).collect(),
            down: down.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// W / S
    pub fn left_hand() -> Self {
        Self::from_names(&["w", "W"], &["s", "S"])
    }

    /// Arrow keys
    pub fn right_hand() -> Self {
        Self::from_names(&["ArrowUp"], &["ArrowDown"])
    }

    /// W / S and arrows, for single-player
    pub fn both() -> Self {
        Self::from_names(&["w", "W", "ArrowUp"], &["s", "S", "ArrowDown"])
    }
}

/// Human player on a fixed key set; owns its own held-key flags
#[derive(Debug, Clone)]
pub struct KeyboardController {
    keys: KeySet,
    up_held: bool,
    down_held: bool,
}

impl KeyboardController {
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys,
            up_held: false,
            down_held: false,
        }
    }

    /// Returns true if the key belongs to this controller
    pub fn key_down(&mut self, key: &str) -> bool {
        self.set_key(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.set_key(key, false)
    }

    fn set_key(&mut self, key: &str, held: bool) -> bool {
        if self.keys.up.iter().any(|k| k == key) {
            self.up_held = held;
            true
        } else if self.keys.down.iter().any(|k| k == key) {
            self.down_held = held;
            true
        } else {
            false
        }
    }

    /// Drop all held keys (focus loss, scene change)
    pub fn release_all(&mut self) {
        self.up_held = false;
        self.down_held = false;
    }
}

impl PaddleController for KeyboardController {
    fn decide(&mut self, _paddle: &Paddle, _ball: &Ball, _ctx: &SimContext) -> Direction {
        match (self.up_held, self.down_held) {
            (true, false) => Direction::Up,
            (false, true) => Direction::Down,
            _ => Direction::Stay,
        }
    }
}

/// AI skill tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }

    /// How often the AI re-reads the ball (ms)
    pub fn reaction_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 220.0,
            Difficulty::Medium => 120.0,
            Difficulty::Hard => 50.0,
        }
    }

    /// Distance from target the AI tolerates before moving (cells)
    pub fn dead_zone(&self) -> f32 {
        match self {
            Difficulty::Easy => 3.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 1.0,
        }
    }

    /// Random error added to the aim point at serve speed (cells, +/-)
    pub fn aim_error(&self) -> f32 {
        match self {
            Difficulty::Easy => 6.0,
            Difficulty::Medium => 3.0,
            Difficulty::Hard => 2.0,
        }
    }

    /// Aim error for a ball moving at `speed`; grows with the speed so long
    /// rallies end
    pub fn aim_error_at(&self, speed: f32) -> f32 {
        self.aim_error() * (speed / BALL_START_SPEED).max(1.0)
    }

    /// Chance that a degauss run throws the AI off
    pub fn disorient_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Medium => 0.6,
            Difficulty::Hard => 0.3,
        }
    }

    /// Share of the degauss run the AI stays confused for
    pub fn recovery_fraction(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 0.7,
            Difficulty::Hard => 0.4,
        }
    }

    /// Whether the AI predicts wall bounces when aiming
    pub fn predicts_bounces(&self) -> bool {
        matches!(self, Difficulty::Hard)
    }
}

/// How long a confused AI holds one random direction (ms)
const JITTER_HOLD_MS: f64 = 140.0;

/// Scripted opponent
#[derive(Debug, Clone)]
pub struct AiController {
    pub side: Side,
    pub difficulty: Difficulty,
    rng: Pcg32,
    target_y: Option<f32>,
    next_think_at: f64,
    /// Start time of the last degauss run the AI rolled for
    seen_degauss: Option<f64>,
    disoriented: bool,
    jitter: Direction,
    jitter_until: f64,
}

impl AiController {
    pub fn new(side: Side, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            side,
            difficulty,
            rng: Pcg32::seed_from_u64(seed),
            target_y: None,
            next_think_at: 0.0,
            seen_degauss: None,
            disoriented: false,
            jitter: Direction::Stay,
            jitter_until: 0.0,
        }
    }

    /// True while a degauss run has the AI confused
    pub fn is_disoriented(&self, ctx: &SimContext) -> bool {
        match ctx.degauss {
            Some(w) if self.disoriented && self.seen_degauss == Some(w.start_ms) => {
                let progress = if w.duration_ms > 0.0 {
                    (ctx.now_ms - w.start_ms) / w.duration_ms
                } else {
                    1.0
                };
                progress < self.difficulty.recovery_fraction()
            }
            _ => false,
        }
    }

    /// Roll once per degauss run for disorientation
    fn observe_degauss(&mut self, ctx: &SimContext) {
        match ctx.degauss {
            Some(w) if self.seen_degauss != Some(w.start_ms) => {
                self.seen_degauss = Some(w.start_ms);
                self.disoriented = self.rng.random::<f32>() < self.difficulty.disorient_chance();
                if self.disoriented {
                    log::debug!("AI {} shaken by degauss", self.side.as_str());
                }
            }
            Some(_) => {}
            None => self.disoriented = false,
        }
    }

    fn jitter(&mut self, now: f64) -> Direction {
        if now >= self.jitter_until {
            self.jitter = match self.rng.random_range(0..3) {
                0 => Direction::Up,
                1 => Direction::Down,
                _ => Direction::Stay,
            };
            self.jitter_until = now + JITTER_HOLD_MS;
        }
        self.jitter
    }

    /// Where the ball's centre will cross this paddle's face
    fn predict_intercept(&self, paddle: &Paddle, ball: &Ball, ctx: &SimContext) -> f32 {
        let face_x = match self.side {
            Side::Left => paddle.x + PADDLE_WIDTH,
            Side::Right => paddle.x - BALL_SIZE,
        };
        let center = ball.center();
        if ball.vel.x.abs() < f32::EPSILON {
            return center.y;
        }
        let t = ((face_x - ball.pos.x) / ball.vel.x).max(0.0);
        let raw = center.y + ball.vel.y * t;
        if !self.difficulty.predicts_bounces() {
            return raw;
        }
        // Fold the straight-line path back into the court between the walls
        let top = 1.0 + BALL_SIZE / 2.0;
        let bottom = ctx.court_height as f32 - 1.0 - BALL_SIZE / 2.0;
        let span = bottom - top;
        if span <= 0.0 {
            return raw;
        }
        let m = (raw - top).rem_euclid(2.0 * span);
        if m <= span { top + m } else { bottom - (m - span) }
    }

    fn ball_approaching(&self, ball: &Ball) -> bool {
        match self.side {
            Side::Left => ball.vel.x < 0.0,
            Side::Right => ball.vel.x > 0.0,
        }
    }
}

impl PaddleController for AiController {
    fn decide(&mut self, paddle: &Paddle, ball: &Ball, ctx: &SimContext) -> Direction {
        self.observe_degauss(ctx);
        if self.is_disoriented(ctx) {
            return self.jitter(ctx.now_ms);
        }

        if self.target_y.is_none() || ctx.now_ms >= self.next_think_at {
            let target = if self.ball_approaching(ball) {
                let error = self.difficulty.aim_error_at(ball.vel.length());
                self.predict_intercept(paddle, ball, ctx) + self.rng.random_range(-error..=error)
            } else {
                ctx.court_height as f32 / 2.0
            };
            self.target_y = Some(target);
            self.next_think_at = ctx.now_ms + self.difficulty.reaction_ms();
        }

        let Some(target) = self.target_y else {
            return Direction::Stay;
        };
        let diff = target - paddle.center_y();
        if diff > self.difficulty.dead_zone() {
            Direction::Down
        } else if diff < -self.difficulty.dead_zone() {
            Direction::Up
        } else {
            Direction::Stay
        }
    }
}

/// Either kind of controller
#[derive(Debug, Clone)]
pub enum Controller {
    Keyboard(KeyboardController),
    Ai(AiController),
}

impl Controller {
    /// Forward a key press; true if a keyboard controller claimed it
    pub fn key_down(&mut self, key: &str) -> bool {
        match self {
            Controller::Keyboard(k) => k.key_down(key),
            Controller::Ai(_) => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        match self {
            Controller::Keyboard(k) => k.key_up(key),
            Controller::Ai(_) => false,
        }
    }

    pub fn release_all(&mut self) {
        if let Controller::Keyboard(k) = self {
            k.release_all();
        }
    }
}

impl PaddleController for Controller {
    fn decide(&mut self, paddle: &Paddle, ball: &Ball, ctx: &SimContext) -> Direction {
        match self {
            Controller::Keyboard(k) => k.decide(paddle, ball, ctx),
            Controller::Ai(a) => a.decide(paddle, ball, ctx),
        }
    }
}
