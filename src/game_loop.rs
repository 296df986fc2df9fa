//! Fixed-timestep driver
//!
//! Frames arrive at whatever rate the display refreshes; the simulation
//! always advances in `tick_dt` steps. Leftover time stays in the
//! accumulator and becomes the interpolation alpha for drawing.

use crate::consts::{MAX_FRAME_SLICE, MAX_SUBSTEPS, SIM_DT};

/// Outcome of one frame's worth of stepping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub steps: u32,
    /// Fraction of a tick left in the accumulator, in [0, 1]
    pub alpha: f32,
    /// The step cap was hit and the backlog dropped
    pub capped: bool,
}

/// Accumulator plus the pre/post snapshots of the most recent step
#[derive(Debug, Clone)]
pub struct FixedTimestep<T> {
    pub tick_dt: f32,
    pub max_frame: f32,
    pub max_steps: u32,
    accumulator: f32,
    was_simulating: bool,
    previous: Option<T>,
    current: Option<T>,
}

impl<T: Clone> Default for FixedTimestep<T> {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_FRAME_SLICE, MAX_SUBSTEPS)
    }
}

impl<T: Clone> FixedTimestep<T> {
    pub fn new(tick_dt: f32, max_frame: f32, max_steps: u32) -> Self {
        Self {
            tick_dt,
            max_frame,
            max_steps,
            accumulator: 0.0,
            was_simulating: false,
            previous: None,
            current: None,
        }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Feed one frame's wall time (seconds) and run the due steps
    ///
    /// `snapshot` captures entity positions; it runs before and after each
    /// step so the pair left behind brackets the last step. Nothing steps
    /// while `simulating` is false, and the accumulator restarts from zero
    /// the frame simulation resumes.
    pub fn advance<S>(
        &mut self,
        frame_dt: f32,
        simulating: bool,
        state: &mut S,
        snapshot: impl Fn(&S) -> T,
        mut step: impl FnMut(&mut S),
    ) -> StepReport {
        let dt = frame_dt.clamp(0.0, self.max_frame);

        let resumed = simulating && !self.was_simulating;
        self.was_simulating = simulating;
        if !simulating {
            self.accumulator = 0.0;
            return StepReport {
                steps: 0,
                alpha: 0.0,
                capped: false,
            };
        }

        self.accumulator += dt;
        if resumed {
            self.accumulator = 0.0;
            let snap = snapshot(state);
            self.previous = Some(snap.clone());
            self.current = Some(snap);
        }

        let mut steps = 0;
        while self.accumulator >= self.tick_dt && steps < self.max_steps {
            self.previous = Some(snapshot(state));
            step(state);
            self.current = Some(snapshot(state));
            self.accumulator -= self.tick_dt;
            steps += 1;
        }

        let capped = self.accumulator >= self.tick_dt;
        if capped {
            log::debug!(
                "Step cap hit, dropping {:.1}ms of simulation",
                (self.accumulator - self.accumulator % self.tick_dt) * 1000.0
            );
            self.accumulator %= self.tick_dt;
        }

        StepReport {
            steps,
            alpha: (self.accumulator / self.tick_dt).clamp(0.0, 1.0),
            capped,
        }
    }

    /// Collapse both snapshots onto `snap` so nothing interpolates across a jump
    pub fn settle(&mut self, snap: T) {
        self.previous = Some(snap.clone());
        self.current = Some(snap);
    }

    /// Snapshots bracketing the last step, `(previous, current)`
    pub fn snapshots(&self) -> Option<(&T, &T)> {
        Some((self.previous.as_ref()?, self.current.as_ref()?))
    }
}
