//! Response-latency model for automated players.
//!
//! Automated players answer faster as the count climbs, down to a floor.

use std::time::Duration;

/// Think time at the start of a match.
pub const BASE_DELAY: Duration = Duration::from_millis(1_500);
/// Fastest an automated player ever answers.
pub const MIN_DELAY: Duration = Duration::from_millis(500);
/// Think time shaved off per number already counted.
pub const DECAY_PER_STEP: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    pub base: Duration,
    pub min: Duration,
    pub decay_per_step: Duration,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            base: BASE_DELAY,
            min: MIN_DELAY,
            decay_per_step: DECAY_PER_STEP,
        }
    }
}

impl Tempo {
    /// `max(min, base - counter * decay_per_step)`
    pub fn delay_for(&self, counter: u32) -> Duration {
        let shaved = self.decay_per_step.saturating_mul(counter);
        self.base.saturating_sub(shaved).max(self.min)
    }
}
