//! Baseline automated player.
//!
//! Knows the rule perfectly but fumbles on purpose with a fixed probability,
//! declaring the opposite of what the number calls for.

use crate::tempo::Tempo;
use crate::AutomatedPlayer;
use buzz7_engine::game::{TurnView, ERROR_RATE};
use buzz7_engine::player::Action;
use buzz7_engine::rules::required_action;
use std::time::Duration;

/// Error-rate policy used for every automated seat by default.
///
/// # Example
///
/// ```rust
/// use buzz7_ai::baseline::BaselineAI;
/// use buzz7_ai::AutomatedPlayer;
/// use buzz7_engine::game::TurnView;
/// use buzz7_engine::player::Action;
///
/// let ai = BaselineAI::with_error_rate(0.25);
/// let turn = TurnView { seat: 2, counter: 7, target: 8, required: false };
///
/// assert_eq!(ai.decide(&turn, 0.10), Action::DeclarePass); // fumble
/// assert_eq!(ai.decide(&turn, 0.60), Action::DeclareNumber);
/// ```
#[derive(Debug, Clone)]
pub struct BaselineAI {
    error_rate: f64,
    tempo: Tempo,
}

impl BaselineAI {
    pub fn new() -> Self {
        Self::with_error_rate(ERROR_RATE)
    }

    /// Rates outside `[0, 1]` are clamped.
    pub fn with_error_rate(error_rate: f64) -> Self {
        Self {
            error_rate: error_rate.clamp(0.0, 1.0),
            tempo: Tempo::default(),
        }
    }

    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.tempo = tempo;
        self
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }
}

impl Default for BaselineAI {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomatedPlayer for BaselineAI {
    fn decide(&self, turn: &TurnView, draw: f64) -> Action {
        let correct = required_action(turn.target);
        if draw < self.error_rate {
            correct.flipped()
        } else {
            correct
        }
    }

    fn think_time(&self, counter: u32) -> Duration {
        self.tempo.delay_for(counter)
    }

    fn name(&self) -> &str {
        "BaselineAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn turn(target: u32) -> TurnView {
        TurnView {
            seat: 1,
            counter: target - 1,
            target,
            required: buzz7_engine::rules::is_pass_required(target),
        }
    }

    #[test]
    fn default_rate_is_twenty_percent() {
        assert_eq!(BaselineAI::default().error_rate(), 0.2);
    }

    #[test]
    fn draw_below_rate_flips_answer() {
        let ai = BaselineAI::with_error_rate(0.2);
        assert_eq!(ai.decide(&turn(14), 0.19), Action::DeclareNumber);
        assert_eq!(ai.decide(&turn(14), 0.2), Action::DeclarePass);
        assert_eq!(ai.decide(&turn(15), 0.0), Action::DeclarePass);
        assert_eq!(ai.decide(&turn(15), 0.99), Action::DeclareNumber);
    }

    #[test]
    fn zero_rate_never_fumbles_and_one_always_does() {
        let careful = BaselineAI::with_error_rate(0.0);
        let clumsy = BaselineAI::with_error_rate(1.0);
        for target in 1..100 {
            let correct = required_action(target);
            assert_eq!(careful.decide(&turn(target), 0.0), correct);
            assert_eq!(clumsy.decide(&turn(target), 0.999), correct.flipped());
        }
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        assert_eq!(BaselineAI::with_error_rate(-1.0).error_rate(), 0.0);
        assert_eq!(BaselineAI::with_error_rate(3.0).error_rate(), 1.0);
    }

    #[test]
    fn fumble_frequency_tracks_rate() {
        let ai = BaselineAI::with_error_rate(0.2);
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 10_000;
        let fumbles = (0..trials)
            .filter(|i| {
                let t = turn(i % 90 + 1);
                ai.decide(&t, rng.random::<f64>()) != required_action(t.target)
            })
            .count();
        let rate = fumbles as f64 / trials as f64;
        assert!((rate - 0.2).abs() < 0.03, "observed rate {}", rate);
    }

    #[test]
    fn think_time_uses_tempo() {
        let ai = BaselineAI::new();
        assert_eq!(ai.think_time(0), Duration::from_millis(1_500));
        assert_eq!(ai.think_time(100), Duration::from_millis(500));
    }
}
