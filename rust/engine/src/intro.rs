//! Pre-match sequence: the roulette that picks the first player, then the
//! 3-2-1-GO countdown.
//!
//! The roulette winner is fixed when the spin starts. The highlight walk is
//! only a presentation plan and never changes who goes first.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base roulette pause. Step `k` waits this plus `k` times
/// [`SPIN_SLOWDOWN_MILLIS`].
pub const SPIN_BASE_MILLIS: u64 = 80;
/// Extra pause added per step so the wheel slows down.
pub const SPIN_SLOWDOWN_MILLIS: u64 = 5;
/// Laps the highlight makes before landing.
pub const SPIN_LAPS: usize = 2;
/// Hold time of each countdown value.
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);
/// First countdown value shown.
pub const COUNTDOWN_FROM: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roulette {
    winner: usize,
    seats: usize,
    highlight: usize,
    step: usize,
}

impl Roulette {
    pub fn new(winner: usize, seats: usize) -> Self {
        Self {
            winner,
            seats,
            highlight: 0,
            step: 0,
        }
    }

    pub fn winner(&self) -> usize {
        self.winner
    }

    pub fn highlight(&self) -> usize {
        self.highlight
    }

    /// Steps in the whole spin: two laps, then walk to the winner.
    pub fn total_steps(&self) -> usize {
        self.seats * SPIN_LAPS + self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.total_steps()
    }

    /// Moves the highlight one seat. Returns the pause before the next step,
    /// or `None` once the spin has landed.
    pub fn advance(&mut self) -> Option<Duration> {
        if self.is_finished() {
            return None;
        }
        self.highlight = (self.highlight + 1) % self.seats;
        self.step += 1;
        Some(Duration::from_millis(
            SPIN_BASE_MILLIS + self.step as u64 * SPIN_SLOWDOWN_MILLIS,
        ))
    }
}

/// Value currently shown by the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownValue {
    Count(u8),
    Go,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    value: CountdownValue,
}

impl Default for Countdown {
    fn default() -> Self {
        Self {
            value: CountdownValue::Count(COUNTDOWN_FROM),
        }
    }
}

impl Countdown {
    pub fn value(&self) -> CountdownValue {
        self.value
    }

    /// Moves to the next value. Returns `false` once GO has been shown and
    /// play should begin.
    pub fn tick(&mut self) -> bool {
        match self.value {
            CountdownValue::Count(n) if n > 1 => {
                self.value = CountdownValue::Count(n - 1);
                true
            }
            CountdownValue::Count(_) => {
                self.value = CountdownValue::Go;
                true
            }
            CountdownValue::Go => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_lands_on_winner() {
        for seats in 2..=10 {
            for winner in 0..seats {
                let mut spin = Roulette::new(winner, seats);
                let mut steps = 0;
                while spin.advance().is_some() {
                    steps += 1;
                }
                assert_eq!(steps, seats * 2 + winner);
                assert_eq!(spin.highlight(), winner);
            }
        }
    }

    #[test]
    fn spin_decelerates() {
        let mut spin = Roulette::new(1, 4);
        let first = spin.advance().expect("first step");
        let second = spin.advance().expect("second step");
        assert_eq!(first, Duration::from_millis(85));
        assert_eq!(second, Duration::from_millis(90));
        assert_eq!(
            first.as_millis() as u64,
            SPIN_BASE_MILLIS + SPIN_SLOWDOWN_MILLIS
        );
    }

    #[test]
    fn countdown_runs_three_two_one_go() {
        let mut countdown = Countdown::default();
        let mut seen = vec![countdown.value()];
        while countdown.tick() {
            seen.push(countdown.value());
        }
        assert_eq!(
            seen,
            vec![
                CountdownValue::Count(3),
                CountdownValue::Count(2),
                CountdownValue::Count(1),
                CountdownValue::Go,
            ]
        );
    }
}
