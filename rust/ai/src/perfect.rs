//! Automated player that never fumbles. Handy for drills and tests.

use crate::tempo::Tempo;
use crate::AutomatedPlayer;
use buzz7_engine::game::TurnView;
use buzz7_engine::player::Action;
use buzz7_engine::rules::required_action;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct PerfectAI {
    tempo: Tempo,
}

impl PerfectAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.tempo = tempo;
        self
    }
}

impl AutomatedPlayer for PerfectAI {
    fn decide(&self, turn: &TurnView, _draw: f64) -> Action {
        required_action(turn.target)
    }

    fn think_time(&self, counter: u32) -> Duration {
        self.tempo.delay_for(counter)
    }

    fn name(&self) -> &str {
        "PerfectAI"
    }
}
