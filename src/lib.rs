//! Phosphor Pong - Pong on an emulated phosphor pixel display
//!
//! Core modules:
//! - `display`: Pixel grid with per-pixel fade, degauss effect, compositor
//! - `sim`: Deterministic game simulation (paddles, ball, scoring, phases)
//! - `game_loop`: Fixed-timestep accumulator with interpolation
//! - `scene`: Draws each game phase onto the pixel grid
//! - `app`: Ties display, simulation, input and loop together

pub mod app;
pub mod display;
pub mod font;
pub mod game_loop;
pub mod scene;
pub mod settings;
pub mod sim;

pub use app::App;
pub use settings::{GameConfig, Settings, SettingsError};

/// Game configuration constants
///
/// Distances are in grid cells, speeds in cells per second.
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock slice a single frame may feed the simulation (seconds)
    pub const MAX_FRAME_SLICE: f32 = 0.1;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 2.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    /// Gap between the screen edge and the paddle's outer face
    pub const PADDLE_MARGIN: f32 = 3.0;
    pub const PADDLE_SPEED: f32 = 60.0;

    /// Ball defaults (square ball)
    pub const BALL_SIZE: f32 = 2.0;
    pub const BALL_START_SPEED: f32 = 40.0;
    pub const BALL_MAX_SPEED: f32 = 95.0;
    /// Speed boost when ball hits paddle (multiplicative)
    pub const PADDLE_BOOST: f32 = 1.06;
    /// Largest vertical share of ball speed a paddle edge hit can add
    pub const PADDLE_SPIN: f32 = 0.8;

    /// Serve angle range from horizontal (radians)
    pub const SERVE_ANGLE_MIN: f32 = 0.2;
    pub const SERVE_ANGLE_MAX: f32 = 0.7;

    /// Score needed to win
    pub const WIN_SCORE: u32 = 5;
    /// Countdown before play starts (ms)
    pub const COUNTDOWN_MS: f64 = 3000.0;
}
