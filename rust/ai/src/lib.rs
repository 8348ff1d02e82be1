//! # buzz7-ai: Automated Players for Buzz 7
//!
//! Provides the automated seats of a Buzz 7 circle. Every automated player
//! answers after a think time that shrinks as the count climbs, and may
//! fumble on purpose so the human has opponents to outlast.
//!
//! ## Core Components
//!
//! - [`AutomatedPlayer`] - Trait defining the interface for automated decisions
//! - [`baseline`] - Error-rate policy used by default
//! - [`perfect`] - Policy that never fumbles
//! - [`tempo`] - Think-time model
//! - [`create_ai`] - Factory function for creating automated players
//! - [`create_ai_with_tempo`] - Factory with a custom think-time model
//!
//! ## Quick Start
//!
//! ```rust
//! use buzz7_ai::{create_ai, AutomatedPlayer};
//! use buzz7_engine::game::TurnView;
//! use buzz7_engine::player::Action;
//!
//! let ai = create_ai("baseline", 0.2);
//! let turn = TurnView { seat: 1, counter: 6, target: 7, required: true };
//!
//! // A draw above the error rate gives the correct answer.
//! assert_eq!(ai.decide(&turn, 0.9), Action::DeclarePass);
//! ```
//!
//! ## AI Types
//!
//! - `"baseline"` - Fumbles with the configured error rate
//! - `"perfect"` - Always answers correctly

use buzz7_engine::game::TurnView;
use buzz7_engine::player::Action;
use std::time::Duration;

pub mod baseline;
pub mod perfect;
pub mod tempo;

/// Trait defining the interface for automated players.
///
/// Decisions are pure: the same turn and the same draw always give the same
/// action, so callers own the randomness and tests can script it.
///
/// # Example Implementation
///
/// ```rust
/// use buzz7_ai::AutomatedPlayer;
/// use buzz7_engine::game::TurnView;
/// use buzz7_engine::player::Action;
/// use std::time::Duration;
///
/// struct AlwaysPass;
///
/// impl AutomatedPlayer for AlwaysPass {
///     fn decide(&self, _turn: &TurnView, _draw: f64) -> Action {
///         Action::DeclarePass
///     }
///
///     fn think_time(&self, _counter: u32) -> Duration {
///         Duration::from_millis(300)
///     }
///
///     fn name(&self) -> &str {
///         "AlwaysPass"
///     }
/// }
/// ```
pub trait AutomatedPlayer: Send + Sync {
    /// Pick the declaration for `turn`. `draw` is uniform in `[0, 1)`.
    fn decide(&self, turn: &TurnView, draw: f64) -> Action;

    /// How long to wait before answering when the counter is at `counter`.
    fn think_time(&self, counter: u32) -> Duration;

    /// Return the name/identifier of this implementation.
    fn name(&self) -> &str;
}

/// Factory function to create automated players by type string.
///
/// Unknown types fall back to the baseline policy.
///
/// ```rust
/// use buzz7_ai::{create_ai, AutomatedPlayer};
///
/// assert_eq!(create_ai("baseline", 0.2).name(), "BaselineAI");
/// assert_eq!(create_ai("perfect", 0.2).name(), "PerfectAI");
/// assert_eq!(create_ai("mystery", 0.2).name(), "BaselineAI");
/// ```
pub fn create_ai(ai_type: &str, error_rate: f64) -> Box<dyn AutomatedPlayer> {
    create_ai_with_tempo(ai_type, error_rate, tempo::Tempo::default())
}

/// Like [`create_ai`] with a custom think-time model.
pub fn create_ai_with_tempo(
    ai_type: &str,
    error_rate: f64,
    tempo: tempo::Tempo,
) -> Box<dyn AutomatedPlayer> {
    match ai_type {
        "perfect" => Box::new(perfect::PerfectAI::new().with_tempo(tempo)),
        _ => Box::new(baseline::BaselineAI::with_error_rate(error_rate).with_tempo(tempo)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automated_player_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn AutomatedPlayer>>();
    }

    #[test]
    fn factory_passes_tempo_through() {
        let tempo = tempo::Tempo {
            base: Duration::from_millis(800),
            min: Duration::from_millis(100),
            decay_per_step: Duration::from_millis(10),
        };
        for name in ["baseline", "perfect"] {
            let ai = create_ai_with_tempo(name, 0.0, tempo);
            assert_eq!(ai.think_time(0), Duration::from_millis(800));
            assert_eq!(ai.think_time(100), Duration::from_millis(100));
        }
    }

    #[test]
    fn empty_name_gets_baseline() {
        assert_eq!(create_ai("", 0.2).name(), "BaselineAI");
    }
}
