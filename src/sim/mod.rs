//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Time comes in through inputs, never read from a clock
//! - No rendering or platform dependencies

pub mod controller;
pub mod state;
pub mod tick;

pub use controller::{
    AiController, Controller, DegaussWindow, Difficulty, Direction, KeySet, KeyboardController,
    PaddleController, SimContext,
};
pub use state::{
    Ball, EntitySnapshot, GameEvent, GameMode, GamePhase, GameState, Paddle, PauseSnapshot, Score,
    Side,
};
pub use tick::{TickInput, tick};
