//! Async driver for Buzz 7 matches.
//!
//! Runs a [`buzz7_engine::game::Match`] on a tokio task, turns its timer
//! requests into real sleeps, lets automated seats answer, publishes
//! [`MatchEvent`]s and asks the host for a closing line once the match ends.

pub mod commentary;
pub mod events;
pub mod logging;
pub mod session;
pub mod settings;

pub use commentary::{
    Commentary, CommentaryClient, CommentaryError, CommentaryProvider, CommentaryRequest, Mood,
};
pub use events::{EventBus, EventSubscription, MatchEvent, PlayerInfo};
pub use logging::{init_logging, init_test_logging, LogEntry, TestLogSubscriber};
pub use session::{summarize, MatchSession, SessionError, SessionHandle, SessionId, SessionView};
pub use settings::{Settings, SettingsError, SettingsResolved, SettingsSources, ValueSource};
