use crate::game::PhaseKind;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),
    #[error("Input is not accepted during phase {phase:?}")]
    InputBlocked { phase: PhaseKind },
    #[error("It's not seat {actual}'s turn (expected seat {expected})")]
    NotPlayersTurn { expected: usize, actual: usize },
    #[error("Seat {seat} is not controlled by the human player")]
    NotHumanSeat { seat: usize },
    #[error("Seat {seat} is not controlled by an automated player")]
    NotAutomatedSeat { seat: usize },
    #[error("Seat {seat} does not exist (roster has {len} seats)")]
    SeatOutOfRange { seat: usize, len: usize },
    #[error("Match already in progress")]
    MatchInProgress,
    #[error("No eligible player left after seat {after}")]
    RosterExhausted { after: usize },
}

impl GameError {
    /// Rejected input that leaves the match untouched. Everything else means
    /// the match bookkeeping is broken.
    pub fn is_input_violation(&self) -> bool {
        matches!(
            self,
            GameError::InputBlocked { .. }
                | GameError::NotPlayersTurn { .. }
                | GameError::NotHumanSeat { .. }
                | GameError::NotAutomatedSeat { .. }
                | GameError::SeatOutOfRange { .. }
                | GameError::MatchInProgress
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_bookkeeping_is_not_rejected_input() {
        assert!(!GameError::RosterExhausted { after: 2 }.is_input_violation());
        assert!(!GameError::InvalidConfig("players".into()).is_input_violation());
    }

    #[test]
    fn bad_input_is_rejected_input() {
        let rejected = [
            GameError::InputBlocked {
                phase: PhaseKind::IntroCountdown,
            },
            GameError::NotPlayersTurn {
                expected: 1,
                actual: 0,
            },
            GameError::NotHumanSeat { seat: 2 },
            GameError::NotAutomatedSeat { seat: 0 },
            GameError::SeatOutOfRange { seat: 9, len: 4 },
            GameError::MatchInProgress,
        ];
        for err in rejected {
            assert!(err.is_input_violation(), "{err}");
        }
    }
}
