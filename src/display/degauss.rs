//! Degauss effect: a short, cooldown-gated wobble of the picture
//!
//! Triggering while a run is active does nothing. The strength of a new
//! run grows with the time since the previous one ended, so hammering the
//! button produces weaker and weaker wobbles.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

use super::surface::Rgba;

/// Below this strength a trigger only restarts the cooldown clock
const MIN_VISIBLE_STRENGTH: f32 = 0.01;

/// Tunables for the effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegaussConfig {
    /// Run length at full strength (ms)
    pub duration_base_ms: f64,
    /// Elapsed time since the last run below which strength is zero (ms)
    pub cooldown_min_ms: f64,
    /// Elapsed time at which strength saturates at 1 (ms)
    pub full_cooldown_ms: f64,
    /// Exponential decay of the wobble, per second
    pub decay_rate: f32,
    /// Temporal frequency of the wobble (Hz)
    pub frequency_hz: f32,
    /// Spatial frequency, radians per grid cell
    pub wavenumber: f32,
    /// Peak displacement in grid cells
    pub amplitude: f32,
    /// Overlay alpha at full strength, before decay
    pub overlay_alpha_max: f32,
    pub overlay_color: Rgba,
}

impl Default for DegaussConfig {
    fn default() -> Self {
        Self {
            duration_base_ms: 1400.0,
            cooldown_min_ms: 400.0,
            full_cooldown_ms: 8000.0,
            decay_rate: 2.2,
            frequency_hz: 9.0,
            wavenumber: 0.35,
            amplitude: 3.0,
            overlay_alpha_max: 0.35,
            overlay_color: Rgba::MAGENTA,
        }
    }
}

impl DegaussConfig {
    /// Strength a run would get after `elapsed` ms of cooldown
    pub fn strength_for_elapsed(&self, elapsed: f64) -> f32 {
        let span = self.full_cooldown_ms - self.cooldown_min_ms;
        let x = if span <= 0.0 {
            if elapsed >= self.full_cooldown_ms { 1.0 } else { 0.0 }
        } else {
            ((elapsed - self.cooldown_min_ms) / span).clamp(0.0, 1.0)
        };
        (x as f32).powf(1.5)
    }
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DegaussOutcome {
    /// A run was already active
    Ignored,
    /// Too soon after the previous run; cooldown clock restarted
    CooldownReset,
    /// A new run started
    Started { strength: f32, duration: f64 },
}

/// Per-display degauss state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DegaussState {
    /// End of the previous run (or of the last swallowed trigger)
    pub last_end_time: Option<f64>,
    /// Start of the active run; `None` while idle
    pub start_time: Option<f64>,
    pub duration: f64,
    pub strength: f32,
}

impl DegaussState {
    pub fn is_active(&self) -> bool {
        self.start_time.is_some()
    }

    /// Start a run unless one is active or the cooldown leaves it invisible
    pub fn trigger(&mut self, now: f64, config: &DegaussConfig) -> DegaussOutcome {
        if self.is_active() {
            log::debug!("Degauss ignored: already running");
            return DegaussOutcome::Ignored;
        }

        let elapsed = match self.last_end_time {
            Some(end) => now - end,
            None => config.full_cooldown_ms,
        };
        let strength = config.strength_for_elapsed(elapsed);

        if strength < MIN_VISIBLE_STRENGTH {
            self.last_end_time = Some(now);
            log::debug!("Degauss too soon ({elapsed:.0}ms), cooldown reset");
            return DegaussOutcome::CooldownReset;
        }

        self.start_time = Some(now);
        self.duration = config.duration_base_ms * strength as f64;
        self.strength = strength;
        log::debug!(
            "Degauss started: strength {:.2}, duration {:.0}ms",
            strength,
            self.duration
        );
        DegaussOutcome::Started {
            strength,
            duration: self.duration,
        }
    }

    /// End an active run whose duration has passed; true if it just ended
    pub fn expire(&mut self, now: f64) -> bool {
        match self.start_time {
            Some(start) if now - start >= self.duration => {
                self.start_time = None;
                self.last_end_time = Some(now);
                log::debug!("Degauss finished");
                true
            }
            _ => false,
        }
    }

    /// Distortion parameters for a frame at `now`, if a run is active
    pub fn frame(&self, now: f64, config: &DegaussConfig) -> Option<DegaussFrame> {
        let start = self.start_time?;
        let t = ((now - start) / 1000.0).max(0.0) as f32;
        let decay = (-config.decay_rate * t).exp();
        Some(DegaussFrame {
            phase: TAU * config.frequency_hz * t,
            wavenumber: config.wavenumber,
            amplitude: config.amplitude * self.strength * decay,
            overlay_alpha: (decay * self.strength * config.overlay_alpha_max).clamp(0.0, 1.0),
        })
    }
}

/// Radial weight that makes the wobble strongest at the screen edges
///
/// `nx`, `ny` are offsets from the centre normalized to [-1, 1]; their
/// squared length spans [0, 2].
#[inline]
pub fn edge_weight(nx: f32, ny: f32) -> f32 {
    let r = nx * nx + ny * ny;
    0.4 + 0.6 * r.min(1.0)
}

/// Frame-constant wobble parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegaussFrame {
    /// Temporal phase (radians)
    pub phase: f32,
    pub wavenumber: f32,
    /// Peak displacement after strength and decay, in cells
    pub amplitude: f32,
    pub overlay_alpha: f32,
}

impl DegaussFrame {
    /// Displacement of grid cell (gx, gy) on a `width` x `height` grid
    ///
    /// X wobbles along rows, Y along columns, a quarter period apart.
    pub fn displacement(&self, gx: i32, gy: i32, width: u32, height: u32) -> Vec2 {
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let nx = if cx > 0.0 { (gx as f32 + 0.5 - cx) / cx } else { 0.0 };
        let ny = if cy > 0.0 { (gy as f32 + 0.5 - cy) / cy } else { 0.0 };
        let amp = self.amplitude * edge_weight(nx, ny);
        Vec2::new(
            (self.phase + gy as f32 * self.wavenumber).sin() * amp,
            (self.phase + gx as f32 * self.wavenumber + FRAC_PI_2).sin() * amp,
        )
    }

    /// Source cell to sample for output cell (gx, gy), clamped to the grid
    pub fn source_cell(&self, gx: i32, gy: i32, width: u32, height: u32) -> (i32, i32) {
        let d = self.displacement(gx, gy, width, height);
        let sx = (gx as f32 - d.x).round() as i32;
        let sy = (gy as f32 - d.y).round() as i32;
        (
            sx.clamp(0, width.saturating_sub(1) as i32),
            sy.clamp(0, height.saturating_sub(1) as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_trigger_is_full_strength() {
        let config = DegaussConfig::default();
        let mut state = DegaussState::default();
        let outcome = state.trigger(500.0, &config);
        assert_eq!(
            outcome,
            DegaussOutcome::Started {
                strength: 1.0,
                duration: config.duration_base_ms
            }
        );
        assert_eq!(state.start_time, Some(500.0));
    }

    #[test]
    fn test_no_stacking() {
        let config = DegaussConfig::default();
        let mut state = DegaussState::default();
        state.trigger(1000.0, &config);
        assert_eq!(state.trigger(1200.0, &config), DegaussOutcome::Ignored);
        assert_eq!(state.start_time, Some(1000.0));
        assert_eq!(state.strength, 1.0);
    }

    #[test]
    fn test_expiry_records_end_time() {
        let config = DegaussConfig::default();
        let mut state = DegaussState::default();
        state.trigger(1000.0, &config);
        assert!(!state.expire(1000.0 + config.duration_base_ms - 1.0));
        assert!(state.expire(1000.0 + config.duration_base_ms));
        assert!(!state.is_active());
        assert_eq!(state.last_end_time, Some(1000.0 + config.duration_base_ms));
        assert!(!state.expire(99_999.0));
    }

    #[test]
    fn test_rapid_retrigger_resets_cooldown() {
        let config = DegaussConfig::default();
        let mut state = DegaussState {
            last_end_time: Some(10_000.0),
            ..Default::default()
        };
        let outcome = state.trigger(10_000.0 + config.cooldown_min_ms / 2.0, &config);
        assert_eq!(outcome, DegaussOutcome::CooldownReset);
        assert!(!state.is_active());
        assert_eq!(state.last_end_time, Some(10_000.0 + config.cooldown_min_ms / 2.0));
    }

    #[test]
    fn test_partial_cooldown_gives_weaker_shorter_run() {
        let config = DegaussConfig::default();
        let mut state = DegaussState {
            last_end_time: Some(0.5),
            ..Default::default()
        };
        let midway = 0.5 + (config.cooldown_min_ms + config.full_cooldown_ms) / 2.0;
        match state.trigger(midway, &config) {
            DegaussOutcome::Started { strength, duration } => {
                assert!((strength - 0.5f32.powf(1.5)).abs() < 1e-4);
                assert!(duration < config.duration_base_ms);
            }
            other => panic!("expected a run, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_weight_range() {
        assert!((edge_weight(0.0, 0.0) - 0.4).abs() < 1e-6);
        assert!((edge_weight(1.0, 0.0) - 1.0).abs() < 1e-6);
        assert!((edge_weight(1.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_decays() {
        let config = DegaussConfig::default();
        let mut state = DegaussState::default();
        assert!(state.frame(0.0, &config).is_none());
        state.trigger(1000.0, &config);
        let early = state.frame(1000.0, &config).unwrap();
        let late = state.frame(2000.0, &config).unwrap();
        assert!((early.overlay_alpha - config.overlay_alpha_max).abs() < 1e-6);
        assert!(late.overlay_alpha < early.overlay_alpha);
        assert!(late.amplitude < early.amplitude);
    }

    #[test]
    fn test_source_cell_clamped() {
        let frame = DegaussFrame {
            phase: FRAC_PI_2,
            wavenumber: 0.0,
            amplitude: 50.0,
            overlay_alpha: 0.0,
        };
        // sin(pi/2) = 1 on x, sin(pi) ~ 0 on y: pushes sampling far left
        assert_eq!(frame.source_cell(9, 5, 10, 10).0, 0);
        let (sx, sy) = frame.source_cell(0, 0, 10, 10);
        assert!((0..10).contains(&sx) && (0..10).contains(&sy));
    }

    proptest! {
        #[test]
        fn prop_strength_monotonic(a in 0.0f64..20_000.0, b in 0.0f64..20_000.0) {
            let config = DegaussConfig::default();
            let (e1, e2) = if a <= b { (a, b) } else { (b, a) };
            let e1 = e1 + config.cooldown_min_ms;
            let e2 = e2 + config.cooldown_min_ms;

            let run = |elapsed: f64| {
                let mut state = DegaussState { last_end_time: Some(1.0), ..Default::default() };
                match state.trigger(1.0 + elapsed, &config) {
                    DegaussOutcome::Started { strength, .. } => strength,
                    _ => 0.0,
                }
            };
            prop_assert!(run(e1) <= run(e2));
            prop_assert!(run(e2) <= 1.0);
        }
    }
}
