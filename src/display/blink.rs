//! Shared blink phase
//!
//! Everything that blinks reads the same `BlinkClock`, so all blinking
//! elements flip together. The value is recomputed lazily, at most once per
//! refresh window.

/// Memoized on/off blink phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkClock {
    pub period_ms: f64,
    pub refresh_ms: f64,
    last_computed_at: Option<f64>,
    value: bool,
}

impl Default for BlinkClock {
    fn default() -> Self {
        Self::new(500.0)
    }
}

impl BlinkClock {
    /// Half of `period_ms` on, half off; refreshed at most every 16ms
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms,
            refresh_ms: 16.0,
            last_computed_at: None,
            value: true,
        }
    }

    /// Blink phase at `now`
    pub fn is_on(&mut self, now: f64) -> bool {
        let stale = match self.last_computed_at {
            Some(at) => now - at >= self.refresh_ms || now < at,
            None => true,
        };
        if stale {
            self.value = self.period_ms <= 0.0 || now.rem_euclid(self.period_ms) < self.period_ms / 2.0;
            self.last_computed_at = Some(now);
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blink_alternates() {
        let mut blink = BlinkClock::new(500.0);
        assert!(blink.is_on(0.0));
        assert!(!blink.is_on(300.0));
        assert!(blink.is_on(520.0));
    }

    #[test]
    fn test_blink_memoized_within_refresh_window() {
        let mut blink = BlinkClock::new(500.0);
        assert!(blink.is_on(240.0));
        // 250 is in the off half, but the cached value is still fresh
        assert!(blink.is_on(250.0));
        assert!(!blink.is_on(260.0));
    }
}
