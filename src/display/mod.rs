//! Phosphor display emulation
//!
//! A low-resolution grid of independently fading pixels, composited onto
//! a higher-resolution surface, with an optional degauss wobble.

pub mod blink;
pub mod canvas;
pub mod clock;
pub mod compositor;
pub mod degauss;
pub mod grid;
pub mod surface;

pub use blink::BlinkClock;
pub use canvas::{Bitmap, Canvas, Mask};
pub use clock::{ManualClock, SystemClock, TimeSource};
pub use compositor::{DisplayConfig, FrameTiming, PixelDisplay};
pub use degauss::{DegaussConfig, DegaussFrame, DegaussOutcome, DegaussState};
pub use grid::{FadeTiming, Geometry, PixelCell, PixelGrid, calculate_brightness};
pub use surface::{Framebuffer, Rgba, Surface};
