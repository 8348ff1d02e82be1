use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::GameError;
use crate::player::{Player, Role};

/// Smallest circle that still makes a game.
pub const MIN_PLAYERS: usize = 2;
/// Largest circle supported.
pub const MAX_PLAYERS: usize = 10;
/// Seat of the human player. Everyone else is automated.
pub const HUMAN_SEAT: usize = 0;

/// The ordered circle of players. Size is fixed for the whole match.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Builds a circle of `count` seats: seat 0 is the human, the rest automated.
    pub fn new(count: usize, lives: u8) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(GameError::InvalidConfig(format!(
                "player count must be between {} and {}, got {}",
                MIN_PLAYERS, MAX_PLAYERS, count
            )));
        }
        if lives == 0 {
            return Err(GameError::InvalidConfig(
                "starting lives must be at least 1".into(),
            ));
        }
        let players = (0..count)
            .map(|id| {
                let role = if id == HUMAN_SEAT {
                    Role::Human
                } else {
                    Role::Automated
                };
                Player::new(id, role, lives)
            })
            .collect();
        Ok(Self { players })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, seat: usize) -> Result<&Player, GameError> {
        self.players.get(seat).ok_or(GameError::SeatOutOfRange {
            seat,
            len: self.players.len(),
        })
    }

    fn get_mut(&mut self, seat: usize) -> Result<&mut Player, GameError> {
        let len = self.players.len();
        self.players
            .get_mut(seat)
            .ok_or(GameError::SeatOutOfRange { seat, len })
    }

    /// Takes one life from `seat` and returns the remaining count.
    /// Elimination is left to the caller.
    pub fn apply_mistake(&mut self, seat: usize) -> Result<u8, GameError> {
        Ok(self.get_mut(seat)?.lose_life())
    }

    /// Marks `seat` eliminated. Calling it twice is harmless.
    pub fn eliminate(&mut self, seat: usize) -> Result<(), GameError> {
        self.get_mut(seat)?.eliminate();
        Ok(())
    }

    /// Stores the speech-bubble text for `seat`. Display only.
    pub fn record_action(
        &mut self,
        seat: usize,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), GameError> {
        self.get_mut(seat)?.annotate(text, at);
        Ok(())
    }

    /// Number of players still in the rotation.
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_eliminated()).count()
    }

    /// True when the human is the last one standing.
    pub fn human_is_sole_survivor(&self) -> bool {
        let mut alive = self.players.iter().filter(|p| !p.is_eliminated());
        matches!((alive.next(), alive.next()), (Some(p), None) if p.is_human())
    }

    /// Automated players knocked out so far.
    pub fn eliminated_opponents(&self) -> usize {
        self.players
            .iter()
            .filter(|p| !p.is_human() && p.is_eliminated())
            .count()
    }
}
