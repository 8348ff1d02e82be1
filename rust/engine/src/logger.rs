use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::game::Outcome;
use crate::player::Action;
use crate::rules::Verdict;

/// One resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Seat that acted
    pub seat: usize,
    /// Number the turn was about
    pub target: u32,
    /// What was declared; `None` when the clock ran out
    pub action: Option<Action>,
    /// Whether the target required "pass"
    pub required: bool,
    pub verdict: Verdict,
    /// Lives the seat had after the turn
    pub lives_after: u8,
    /// Whether the seat was knocked out by this turn
    pub eliminated: bool,
}

/// Complete log of a match, emitted as one JSON line when it concludes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    /// Seed of the random source, when the match was seeded
    pub seed: Option<u64>,
    pub players: usize,
    pub turns: Vec<TurnRecord>,
    pub outcome: Option<Outcome>,
    /// Timestamp of the record (RFC3339)
    #[serde(default)]
    pub ts: Option<String>,
}

impl MatchRecord {
    pub fn new(
        match_id: impl Into<String>,
        seed: Option<u64>,
        players: usize,
        turns: Vec<TurnRecord>,
        outcome: Option<Outcome>,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            seed,
            players,
            turns,
            outcome,
            ts: None,
        }
    }

    /// Serializes the record, stamping it with the current time if unset.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut rec = self.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        serde_json::to_string(&rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MistakeKind;

    #[test]
    fn json_line_is_single_line_with_timestamp() {
        let record = MatchRecord::new(
            "m-1",
            Some(9),
            3,
            vec![TurnRecord {
                seat: 1,
                target: 7,
                action: Some(Action::DeclareNumber),
                required: true,
                verdict: Verdict::Mistake(MistakeKind::WrongNumber),
                lives_after: 2,
                eliminated: false,
            }],
            None,
        );
        let line = record.to_json_line().expect("serialize");
        assert!(!line.contains('\n'));
        let parsed: MatchRecord = serde_json::from_str(&line).expect("parse");
        assert!(parsed.ts.is_some());
        assert_eq!(parsed.turns, record.turns);
    }
}
