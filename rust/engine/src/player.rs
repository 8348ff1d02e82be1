use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Default number of lives each player starts with.
pub const STARTING_LIVES: u8 = 3;

/// How long a last-action annotation stays on screen.
pub const BUBBLE_MILLIS: i64 = 1_500;

/// Who controls a seat.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Driven by external input
    Human,
    /// Driven by an automated policy
    Automated,
}

/// What a player declares on their turn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Say the next number out loud
    DeclareNumber,
    /// Say "pass" instead of the number
    DeclarePass,
}

impl Action {
    /// The opposite declaration.
    pub fn flipped(self) -> Self {
        match self {
            Action::DeclareNumber => Action::DeclarePass,
            Action::DeclarePass => Action::DeclareNumber,
        }
    }
}

/// Transient speech-bubble annotation. Never consulted by the rules.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LastAction {
    pub text: String,
    pub at: DateTime<Utc>,
}

impl LastAction {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.at) < ChronoDuration::milliseconds(BUBBLE_MILLIS)
    }
}

/// A seat in the circle: lives, elimination and the last thing they said.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: usize,
    role: Role,
    lives: u8,
    eliminated: bool,
    last_action: Option<LastAction>,
}

impl Player {
    pub fn new(id: usize, role: Role, lives: u8) -> Self {
        Self {
            id,
            role,
            lives,
            eliminated: false,
            last_action: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
    pub fn lives(&self) -> u8 {
        self.lives
    }
    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }
    pub fn last_action(&self) -> Option<&LastAction> {
        self.last_action.as_ref()
    }

    /// Removes one life and returns what is left.
    pub fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn eliminate(&mut self) {
        self.eliminated = true;
    }

    pub fn annotate(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
        self.last_action = Some(LastAction {
            text: text.into(),
            at,
        });
    }
}
