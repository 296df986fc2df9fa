//! Emulated pixel grid with per-pixel phosphor fade
//!
//! Each cell remembers when it last switched on and when it last switched
//! off. Brightness is derived from those two timestamps and the current
//! time, never stored, so a cell can be fading out and fading back in at
//! the same moment.

use serde::{Deserialize, Serialize};

use super::canvas::{Canvas, Mask};
use super::clock::{SystemClock, TimeSource};

/// Backdating margin for cells that are already dark when the grid is cleared
const CLEAR_EPSILON_MS: f64 = 1.0;

/// Fade-in exponent is linear; fade-out uses this power for a fast drop and long tail
const FADE_OUT_EXPONENT: i32 = 6;

/// One logical pixel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelCell {
    pub state: bool,
    pub on_timestamp: f64,
    pub off_timestamp: f64,
}

/// Fade durations in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeTiming {
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            fade_in_ms: 40.0,
            fade_out_ms: 350.0,
        }
    }
}

/// Brightness of a cell at `now`, in [0, 1]
///
/// Fade-in is a linear ramp from the on-timestamp. Fade-out is
/// `(1 - e/fade_out)^6` from the off-timestamp and applies whatever the
/// current state is, so a pixel re-lit right after going dark still
/// carries its residual glow.
pub fn calculate_brightness(cell: &PixelCell, now: f64, timing: &FadeTiming) -> f32 {
    let fade_in = if cell.state {
        if timing.fade_in_ms <= 0.0 {
            1.0
        } else {
            ((now - cell.on_timestamp) / timing.fade_in_ms).clamp(0.0, 1.0)
        }
    } else {
        0.0
    };

    let fade_out = if cell.off_timestamp > 0.0 && timing.fade_out_ms > 0.0 {
        let e = now - cell.off_timestamp;
        if e < timing.fade_out_ms {
            (1.0 - e / timing.fade_out_ms).max(0.0).powi(FADE_OUT_EXPONENT)
        } else {
            0.0
        }
    } else {
        0.0
    };

    fade_in.max(fade_out).clamp(0.0, 1.0) as f32
}

/// Mapping between grid cells and output-surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub output_width: f32,
    pub output_height: f32,
    /// Dark gap between neighbouring cells, in output pixels
    pub gap: f32,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Geometry {
    pub fn new(grid_width: u32, grid_height: u32, output_width: f32, output_height: f32, gap: f32) -> Self {
        let cell_width = output_width / grid_width.max(1) as f32;
        let cell_height = output_height / grid_height.max(1) as f32;
        Self {
            output_width,
            output_height,
            gap: gap.clamp(0.0, cell_width.min(cell_height)),
            cell_width,
            cell_height,
        }
    }

    /// Output rectangle `(x, y, w, h)` of the lit part of cell (gx, gy)
    #[inline]
    pub fn cell_rect(&self, gx: i32, gy: i32) -> (f32, f32, f32, f32) {
        let half = self.gap / 2.0;
        (
            gx as f32 * self.cell_width + half,
            gy as f32 * self.cell_height + half,
            self.cell_width - self.gap,
            self.cell_height - self.gap,
        )
    }

    /// Grid cell under a surface-space point (not bounds-checked)
    pub fn surface_to_grid(&self, sx: f32, sy: f32) -> (i32, i32) {
        (
            (sx / self.cell_width).floor() as i32,
            (sy / self.cell_height).floor() as i32,
        )
    }
}

/// The emulated display memory
pub struct PixelGrid {
    width: u32,
    height: u32,
    cells: Vec<PixelCell>,
    timing: FadeTiming,
    geometry: Geometry,
    clock: Box<dyn TimeSource>,
    time_override: Option<f64>,
}

impl std::fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("timing", &self.timing)
            .field("geometry", &self.geometry)
            .field("time_override", &self.time_override)
            .finish_non_exhaustive()
    }
}

impl PixelGrid {
    /// Grid on the wall clock
    pub fn new(width: u32, height: u32, timing: FadeTiming, geometry: Geometry) -> Self {
        Self::with_clock(width, height, timing, geometry, Box::new(SystemClock::new()))
    }

    pub fn with_clock(
        width: u32,
        height: u32,
        timing: FadeTiming,
        geometry: Geometry,
        clock: Box<dyn TimeSource>,
    ) -> Self {
        Self {
            width,
            height,
            cells: vec![PixelCell::default(); width as usize * height as usize],
            timing,
            geometry,
            clock,
            time_override: None,
        }
    }

    #[inline]
    pub fn grid_width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn grid_height(&self) -> u32 {
        self.height
    }

    pub fn timing(&self) -> &FadeTiming {
        &self.timing
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Pin the grid's notion of "now" (tests, replays, per-frame timestamps)
    pub fn set_time_override(&mut self, now: Option<f64>) {
        self.time_override = now;
    }

    /// Current time in ms: the override if set, else the clock
    #[inline]
    pub fn now(&self) -> f64 {
        self.time_override.unwrap_or_else(|| self.clock.now_ms())
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Command a pixel on or off
    ///
    /// Only an actual change of state stamps a timestamp; out-of-bounds
    /// writes are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, state: bool) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i].state == state {
            return;
        }
        let now = self.now();
        let cell = &mut self.cells[i];
        cell.state = state;
        if state {
            cell.on_timestamp = now;
        } else {
            cell.off_timestamp = now;
        }
    }

    /// Logical state; false outside the grid
    pub fn get_pixel(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i].state)
    }

    /// Cell record; `None` outside the grid
    pub fn cell(&self, x: i32, y: i32) -> Option<&PixelCell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Brightness of one cell now; 0 outside the grid
    pub fn brightness(&self, x: i32, y: i32) -> f32 {
        self.brightness_at(x, y, self.now())
    }

    /// Brightness of one cell at an explicit time; 0 outside the grid
    #[inline]
    pub fn brightness_at(&self, x: i32, y: i32, now: f64) -> f32 {
        self.cell(x, y)
            .map(|c| calculate_brightness(c, now, &self.timing))
            .unwrap_or(0.0)
    }

    /// Switch every cell off
    ///
    /// Lit cells start fading from now. Dark cells are backdated past the
    /// fade-out window so they stay dark instead of glowing as if they had
    /// just been switched off.
    pub fn clear(&mut self) {
        let (w, h) = (self.width as i32, self.height as i32);
        self.clear_rect(0, 0, w, h, None);
    }

    /// `clear` limited to a rectangle; cells where `preserve` returns true are untouched
    pub fn clear_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        preserve: Option<&dyn Fn(i32, i32) -> bool>,
    ) {
        let now = self.now();
        let dark_stamp = now - self.timing.fade_out_ms - CLEAR_EPSILON_MS;
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                if preserve.is_some_and(|keep| keep(px, py)) {
                    continue;
                }
                let i = py as usize * self.width as usize + px as usize;
                let cell = &mut self.cells[i];
                if cell.state {
                    cell.state = false;
                    cell.off_timestamp = now;
                } else {
                    cell.off_timestamp = dark_stamp;
                }
            }
        }
    }

    /// Make the grid's logical state equal to `mask`
    ///
    /// Goes through `set_pixel`, so cells already in the wanted state keep
    /// their timestamps and cells leaving the frame fade out normally.
    pub fn apply_mask(&mut self, mask: &Mask) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.set_pixel(x, y, mask.get(x, y));
            }
        }
    }

    /// Number of cells currently commanded on
    pub fn lit_count(&self) -> usize {
        self.cells.iter().filter(|c| c.state).count()
    }
}

impl Canvas for PixelGrid {
    fn width(&self) -> i32 {
        self.width as i32
    }

    fn height(&self) -> i32 {
        self.height as i32
    }

    fn set(&mut self, x: i32, y: i32, on: bool) {
        self.set_pixel(x, y, on);
    }
}
