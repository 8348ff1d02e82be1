//! # buzz7-engine: Buzz 7 Match Engine Core
//!
//! Rules and turn state machine for "Buzz 7" (逢七过): players count up in a
//! circle and must say "pass" instead of any number that is a multiple of 7 or
//! contains the digit 7. Mistakes cost lives; the last one standing wins.
//!
//! The engine is synchronous and clock-free. Timers are handed back to the
//! caller as epoch-stamped [`timer::TimerEvent`]s and fired back in when due.
//!
//! ## Core Modules
//!
//! - [`rules`] - Pass condition and turn judging
//! - [`player`] - Player state, roles and declarations
//! - [`roster`] - The ordered circle of players
//! - [`turn`] - Next-seat selection skipping eliminated players
//! - [`intro`] - Roulette and countdown before the first turn
//! - [`game`] - Match state machine
//! - [`timer`] - Epoch-stamped timer events
//! - [`rng`] - Seedable random source
//! - [`logger`] - Per-turn match records
//! - [`errors`] - Error types for match operations
//!
//! ## Quick Start
//!
//! ```rust
//! use buzz7_engine::rules::is_pass_required;
//!
//! assert!(is_pass_required(21));
//! assert!(is_pass_required(37));
//! assert!(!is_pass_required(22));
//! ```
//!
//! ## Deterministic Matches
//!
//! ```rust
//! use buzz7_engine::game::{Match, MatchConfig};
//! use buzz7_engine::rng::SeededRng;
//!
//! let mut a = Match::new(MatchConfig::default(), SeededRng::new_with_seed(42)).unwrap();
//! let mut b = Match::new(MatchConfig::default(), SeededRng::new_with_seed(42)).unwrap();
//! a.start().unwrap();
//! b.start().unwrap();
//! // Both matches pick the same starting player.
//! assert_eq!(a.phase(), b.phase());
//! ```

pub mod errors;
pub mod game;
pub mod intro;
pub mod logger;
pub mod player;
pub mod rng;
pub mod roster;
pub mod rules;
pub mod timer;
pub mod turn;
