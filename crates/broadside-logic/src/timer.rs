//! Explicit elapsed/duration timers.
//!
//! Every timed behaviour (reload, evasion, zipline, despawn delay) owns a
//! `Timer` and advances it from its owner's tick. Nothing ever waits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub elapsed: f32,
    pub duration: f32,
}

impl Timer {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Advance by `dt` seconds. Returns true once the timer has finished.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.finished()
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Fraction complete in [0, 1]. A zero-length timer is always complete.
    pub fn fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_finishes_after_duration() {
        let mut t = Timer::new(1.0);
        assert!(!t.tick(0.4));
        assert!(!t.tick(0.4));
        assert!(t.tick(0.4));
        assert_eq!(t.remaining(), 0.0);
        assert_eq!(t.fraction(), 1.0);
    }

    #[test]
    fn test_zero_duration_is_immediately_done() {
        let t = Timer::new(0.0);
        assert!(t.finished());
        assert_eq!(t.fraction(), 1.0);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut t = Timer::new(2.0);
        t.tick(-5.0);
        assert_eq!(t.elapsed, 0.0);
    }
}
