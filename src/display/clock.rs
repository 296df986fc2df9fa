//! Millisecond time sources
//!
//! The display never sleeps or blocks. Every fade and degauss calculation
//! compares stored timestamps against one of these clocks.

use std::cell::Cell;
use std::rc::Rc;

/// A monotonic millisecond clock
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Wall clock, measured from construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    origin: f64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }

    // std::time::Instant panics on wasm32-unknown-unknown
    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {
            origin: js_sys::Date::now(),
        }
    }
}

impl TimeSource for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now() - self.origin
    }
}

/// Hand-driven clock for tests and headless replays
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give the other to the display.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
