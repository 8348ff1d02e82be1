use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a scheduled event does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    RouletteStep,
    CountdownStep,
    TurnTimeout,
    AutomatedDecision,
}

/// A request to call back into the match after `delay`.
///
/// The event carries the epoch it was scheduled in. Once the match moves on,
/// the epoch changes and the event is ignored when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub epoch: u64,
    pub kind: TimerKind,
    pub delay: Duration,
}

/// Epoch counter backing every timer the match hands out.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    epoch: u64,
}

impl Timers {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stamps a new event with the current epoch.
    pub fn schedule(&self, kind: TimerKind, delay: Duration) -> TimerEvent {
        TimerEvent {
            epoch: self.epoch,
            kind,
            delay,
        }
    }

    /// Invalidates everything scheduled so far.
    pub fn cancel_all(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn is_current(&self, event: &TimerEvent) -> bool {
        event.epoch == self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_makes_old_events_stale() {
        let mut timers = Timers::default();
        let old = timers.schedule(TimerKind::TurnTimeout, Duration::from_secs(2));
        assert!(timers.is_current(&old));
        timers.cancel_all();
        assert!(!timers.is_current(&old));
        let fresh = timers.schedule(TimerKind::TurnTimeout, Duration::from_secs(2));
        assert!(timers.is_current(&fresh));
    }
}
