//! Compositing the pixel grid onto an output surface
//!
//! A render pass fills the surface with the off colour, then draws every
//! visible cell as a gap-separated rectangle whose alpha is the cell's
//! brightness. While a degauss run is active the pass walks the *output*
//! cells instead and samples the grid at displaced coordinates, which
//! covers every output cell exactly once; the magenta wash goes on last.

use serde::{Deserialize, Serialize};

use super::clock::TimeSource;
use super::degauss::{DegaussConfig, DegaussOutcome, DegaussState};
use super::grid::{FadeTiming, Geometry, PixelGrid};
use super::surface::{Rgba, Surface};

/// Construction parameters for a display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub emulated_width: u32,
    pub emulated_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Target display refresh rate (Hz)
    pub refresh_rate: f64,
    /// Gap between cells in output pixels
    pub pixel_gap: f32,
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
    pub on_color: Rgba,
    pub off_color: Rgba,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let fade = FadeTiming::default();
        Self {
            emulated_width: 96,
            emulated_height: 64,
            output_width: 960,
            output_height: 640,
            refresh_rate: 60.0,
            pixel_gap: 1.0,
            fade_in_ms: fade.fade_in_ms,
            fade_out_ms: fade.fade_out_ms,
            on_color: Rgba::rgb(200, 255, 210),
            off_color: Rgba::BLACK,
        }
    }
}

impl DisplayConfig {
    /// Milliseconds between frames at the target refresh rate
    pub fn target_interval_ms(&self) -> f64 {
        if self.refresh_rate > 0.0 {
            1000.0 / self.refresh_rate
        } else {
            1000.0 / 60.0
        }
    }

    pub fn fade_timing(&self) -> FadeTiming {
        FadeTiming {
            fade_in_ms: self.fade_in_ms,
            fade_out_ms: self.fade_out_ms,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(
            self.emulated_width,
            self.emulated_height,
            self.output_width as f32,
            self.output_height as f32,
            self.pixel_gap,
        )
    }
}

/// Timing figures produced by a render pass, for delta-based consumers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Time the frame was composited at (ms)
    pub now: f64,
    /// How far the frame interval strayed from the target
    pub drift_ms: f64,
    /// Frame delta clamped to two target intervals
    pub effective_delta_ms: f64,
    pub degauss_active: bool,
}

/// Grid + degauss + compositor for one output surface
#[derive(Debug)]
pub struct PixelDisplay {
    grid: PixelGrid,
    degauss: DegaussState,
    degauss_config: DegaussConfig,
    on_color: Rgba,
    off_color: Rgba,
    target_interval_ms: f64,
}

impl PixelDisplay {
    /// Display on the wall clock
    pub fn new(config: &DisplayConfig, degauss_config: DegaussConfig) -> Self {
        let grid = PixelGrid::new(
            config.emulated_width,
            config.emulated_height,
            config.fade_timing(),
            config.geometry(),
        );
        Self::from_grid(grid, config, degauss_config)
    }

    pub fn with_clock(
        config: &DisplayConfig,
        degauss_config: DegaussConfig,
        clock: Box<dyn TimeSource>,
    ) -> Self {
        let grid = PixelGrid::with_clock(
            config.emulated_width,
            config.emulated_height,
            config.fade_timing(),
            config.geometry(),
            clock,
        );
        Self::from_grid(grid, config, degauss_config)
    }

    fn from_grid(grid: PixelGrid, config: &DisplayConfig, degauss_config: DegaussConfig) -> Self {
        log::info!(
            "Display {}x{} cells -> {}x{} px ({:.1}px cells)",
            config.emulated_width,
            config.emulated_height,
            config.output_width,
            config.output_height,
            grid.geometry().cell_width
        );
        Self {
            grid,
            degauss: DegaussState::default(),
            degauss_config,
            on_color: config.on_color,
            off_color: config.off_color,
            target_interval_ms: config.target_interval_ms(),
        }
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut PixelGrid {
        &mut self.grid
    }

    pub fn now(&self) -> f64 {
        self.grid.now()
    }

    pub fn set_time_override(&mut self, now: Option<f64>) {
        self.grid.set_time_override(now);
    }

    pub fn target_interval_ms(&self) -> f64 {
        self.target_interval_ms
    }

    pub fn degauss_state(&self) -> &DegaussState {
        &self.degauss
    }

    pub fn degauss_config(&self) -> &DegaussConfig {
        &self.degauss_config
    }

    /// Fire the degauss coil
    pub fn degauss(&mut self) -> DegaussOutcome {
        let now = self.grid.now();
        // A run past its duration counts as over even before the next render
        self.degauss.expire(now);
        self.degauss.trigger(now, &self.degauss_config)
    }

    /// `(start, duration)` of the active degauss run, if any
    pub fn degauss_window(&self) -> Option<(f64, f64)> {
        self.degauss.start_time.map(|start| (start, self.degauss.duration))
    }

    /// Composite one frame
    ///
    /// `elapsed_ms` is the wall time since the previous render call.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, elapsed_ms: f64) -> FrameTiming {
        let now = self.grid.now();
        let drift_ms = elapsed_ms - self.target_interval_ms;
        let effective_delta_ms = elapsed_ms.min(2.0 * self.target_interval_ms);

        // Expire before sampling so an ended run never leaks into this frame
        self.degauss.expire(now);

        let (sw, sh) = surface.size();
        surface.fill_rect(0.0, 0.0, sw as f32, sh as f32, self.off_color);

        let frame = self.degauss.frame(now, &self.degauss_config);
        let geometry = *self.grid.geometry();
        let (w, h) = (self.grid.grid_width(), self.grid.grid_height());

        for gy in 0..h as i32 {
            for gx in 0..w as i32 {
                let (sx, sy) = match &frame {
                    Some(f) => f.source_cell(gx, gy, w, h),
                    None => (gx, gy),
                };
                let brightness = self.grid.brightness_at(sx, sy, now);
                if brightness <= 0.0 {
                    continue;
                }
                let (x, y, cw, ch) = geometry.cell_rect(gx, gy);
                surface.fill_rect(x, y, cw, ch, self.on_color.with_alpha(brightness));
            }
        }

        if let Some(f) = &frame {
            let overlay = self.degauss_config.overlay_color.with_alpha(f.overlay_alpha);
            surface.fill_rect(0.0, 0.0, sw as f32, sh as f32, overlay);
        }

        FrameTiming {
            now,
            drift_ms,
            effective_delta_ms,
            degauss_active: frame.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::canvas::Canvas;
    use crate::display::surface::Framebuffer;

    fn small_config() -> DisplayConfig {
        DisplayConfig {
            emulated_width: 4,
            emulated_height: 4,
            output_width: 40,
            output_height: 40,
            pixel_gap: 2.0,
            fade_in_ms: 50.0,
            fade_out_ms: 200.0,
            on_color: Rgba::rgb(255, 255, 255),
            ..Default::default()
        }
    }

    fn display_at(now: f64) -> PixelDisplay {
        let mut display = PixelDisplay::new(&small_config(), DegaussConfig::default());
        display.set_time_override(Some(now));
        display
    }

    #[test]
    fn test_lit_cell_drawn_with_gap() {
        let mut display = display_at(1000.0);
        display.grid_mut().set_pixel(1, 1, true);
        display.set_time_override(Some(2000.0));

        let mut fb = Framebuffer::new(40, 40);
        let timing = display.render(&mut fb, 1000.0 / 60.0);
        assert!(!timing.degauss_active);

        // Cell (1,1) covers 10..20; one pixel of gap on each side
        assert_eq!(fb.pixel(15, 15), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(fb.pixel(10, 15), Some(Rgba::BLACK));
        assert_eq!(fb.pixel(5, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_half_faded_cell_is_dimmer() {
        let mut display = display_at(1000.0);
        display.grid_mut().set_pixel(0, 0, true);
        display.set_time_override(Some(1025.0));

        let mut fb = Framebuffer::new(40, 40);
        display.render(&mut fb, 16.0);
        let p = fb.pixel(5, 5).unwrap();
        assert!(p.r > 100 && p.r < 160, "got {}", p.r);
    }

    #[test]
    fn test_frame_timing_drift_and_clamp() {
        let mut display = display_at(1000.0);
        let mut fb = Framebuffer::new(40, 40);
        let interval = display.target_interval_ms();

        let timing = display.render(&mut fb, 100.0);
        assert!((timing.drift_ms - (100.0 - interval)).abs() < 1e-9);
        assert!((timing.effective_delta_ms - 2.0 * interval).abs() < 1e-9);

        let timing = display.render(&mut fb, interval);
        assert!(timing.drift_ms.abs() < 1e-9);
        assert_eq!(timing.effective_delta_ms, interval);
    }

    #[test]
    fn test_degauss_overlay_and_coverage() {
        let mut display = display_at(1000.0);
        display.grid_mut().fill_rect(0, 0, 4, 4, true);
        display.set_time_override(Some(5000.0));
        assert!(matches!(display.degauss(), DegaussOutcome::Started { .. }));

        let mut fb = Framebuffer::new(40, 40);
        let timing = display.render(&mut fb, 16.0);
        assert!(timing.degauss_active);

        // Every output cell samples a lit cell, so every cell centre is lit and tinted
        for gy in 0..4 {
            for gx in 0..4 {
                let p = fb.pixel(gx * 10 + 5, gy * 10 + 5).unwrap();
                assert!(p.r > 200 && p.b > 200);
                assert!(p.g < p.r, "magenta wash missing at ({gx},{gy})");
            }
        }
        // Gaps are black with only the wash on top
        let gap = fb.pixel(0, 0).unwrap();
        assert_eq!(gap.g, 0);
        assert!(gap.r > 0);
    }

    #[test]
    fn test_degauss_warp_moves_lit_cell() {
        let config = DegaussConfig {
            amplitude: 50.0,
            wavenumber: 0.0,
            ..Default::default()
        };
        let mut display = PixelDisplay::new(&small_config(), config);
        display.set_time_override(Some(1000.0));
        display.grid_mut().set_pixel(2, 0, true);
        display.set_time_override(Some(5000.0));

        let mut fb = Framebuffer::new(40, 40);
        display.render(&mut fb, 16.0);
        assert_eq!(fb.pixel(25, 35), Some(Rgba::BLACK));

        // At t=0 the x wave is sin(0) and the y wave pushes every sample up
        // past the top row, so column 2 shows the one lit cell all the way down
        display.degauss();
        display.render(&mut fb, 16.0);
        let moved = fb.pixel(25, 35).unwrap();
        assert!(moved.g > 100, "lit cell not sampled at (2,3): {moved:?}");
        let beside = fb.pixel(35, 35).unwrap();
        assert_eq!(beside.g, 0);
        assert!(beside.r > 0);
    }

    #[test]
    fn test_degauss_after_run_ends_starts_without_render() {
        let mut display = display_at(5000.0);
        assert!(matches!(display.degauss(), DegaussOutcome::Started { .. }));
        let (start, duration) = display.degauss_window().unwrap();

        display.set_time_override(Some(start + duration + 1.0));
        assert_ne!(display.degauss(), DegaussOutcome::Ignored);
        assert_eq!(
            display.degauss_state().last_end_time,
            Some(start + duration + 1.0)
        );
    }

    #[test]
    fn test_degauss_expires_before_compositing() {
        let mut display = display_at(5000.0);
        display.degauss();
        let (start, duration) = display.degauss_window().unwrap();
        display.set_time_override(Some(start + duration));

        let mut fb = Framebuffer::new(40, 40);
        let timing = display.render(&mut fb, 16.0);
        assert!(!timing.degauss_active);
        assert!(display.degauss_window().is_none());
        assert!(fb.pixels().iter().all(|p| *p == Rgba::BLACK));
    }
}
