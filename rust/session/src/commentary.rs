//! Host commentary shown after a match concludes.
//!
//! The text comes from an injected [`CommentaryProvider`]. Nothing here ever
//! fails outward: a missing provider, an error or a blank reply all turn into
//! fixed fallback lines.

use buzz7_engine::game::{Outcome, OutcomeReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shown when no provider is configured.
pub const UNCONFIGURED_TEXT: &str =
    "Game over! Set up a commentary API key to unlock the host's roast.";
/// Shown when the provider fails.
pub const FAILURE_TEXT: &str = "My CPU burned out, but you played well!";
/// Replaces a blank reply.
pub const BLANK_REPLY_TEXT: &str = "Better luck next time!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sarcastic,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub text: String,
    pub mood: Mood,
}

impl Commentary {
    pub fn unconfigured() -> Self {
        Self {
            text: UNCONFIGURED_TEXT.into(),
            mood: Mood::Neutral,
        }
    }

    pub fn failure() -> Self {
        Self {
            text: FAILURE_TEXT.into(),
            mood: Mood::Neutral,
        }
    }
}

/// What the host is asked to comment on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryRequest {
    pub final_counter: u32,
    pub reason: OutcomeReason,
}

impl From<&Outcome> for CommentaryRequest {
    fn from(outcome: &Outcome) -> Self {
        Self {
            final_counter: outcome.final_counter,
            reason: outcome.reason,
        }
    }
}

impl CommentaryRequest {
    pub fn mood(&self) -> Mood {
        if self.reason.is_victory() {
            Mood::Happy
        } else {
            Mood::Sarcastic
        }
    }

    /// Host-persona prompt handed to the provider.
    pub fn prompt(&self) -> String {
        let tone = if self.reason.is_victory() {
            "The player is the last survivor. Praise them."
        } else {
            "The player was knocked out. Tease them with some humor."
        };
        format!(
            "You are the witty, slightly sarcastic host of a \"Buzz 7\" battle royale.\n\
             The player just finished a game.\n\
             The count reached: {}.\n\
             Outcome: {}.\n\
             Rules: players count around a circle and must say \"pass\" instead of any \
             number that is a multiple of 7 or contains the digit 7. The player is up \
             against automated opponents.\n\
             {}\n\
             Reply with one short, punchy line of plain text.",
            self.final_counter, self.reason, tone
        )
    }
}

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("Commentary provider unavailable: {0}")]
    Unavailable(String),
    #[error("Commentary request failed: {0}")]
    Failed(String),
}

/// Text generator behind the host. Called off the async runtime, so a
/// blocking implementation is fine.
pub trait CommentaryProvider: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, CommentaryError>;
}

#[derive(Clone, Default)]
pub struct CommentaryClient {
    provider: Option<Arc<dyn CommentaryProvider>>,
}

impl fmt::Debug for CommentaryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentaryClient")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl CommentaryClient {
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_provider(provider: Arc<dyn CommentaryProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Always produces a non-blank line.
    pub fn commentate(&self, request: &CommentaryRequest) -> Commentary {
        let Some(provider) = &self.provider else {
            return Commentary::unconfigured();
        };
        match provider.complete(&request.prompt()) {
            Ok(reply) => {
                let text = reply.trim();
                Commentary {
                    text: if text.is_empty() {
                        BLANK_REPLY_TEXT.to_string()
                    } else {
                        text.to_string()
                    },
                    mood: request.mood(),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "commentary provider failed, using fallback");
                Commentary::failure()
            }
        }
    }
}
