use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::GameError;
use crate::intro::{Countdown, CountdownValue, Roulette, COUNTDOWN_STEP};
use crate::logger::{MatchRecord, TurnRecord};
use crate::player::{Action, Player, STARTING_LIVES};
use crate::rng::{RandomSource, SeededRng};
use crate::roster::{Roster, HUMAN_SEAT};
use crate::rules::{is_pass_required, judge, spoken, MistakeKind, Verdict};
use crate::timer::{TimerEvent, TimerKind, Timers};
use crate::turn::next_active;

/// Default time a player gets to answer.
pub const TURN_TIME: Duration = Duration::from_millis(2_000);
/// Default chance that an automated player fumbles on purpose.
pub const ERROR_RATE: f64 = 0.2;
/// Default circle size: the human and three automated players.
pub const DEFAULT_PLAYERS: usize = 4;

/// Settings fixed for the lifetime of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub player_count: usize,
    pub starting_lives: u8,
    pub turn_time: Duration,
    pub error_rate: f64,
    /// Seed for [`Match::from_config`]. Ignored when the caller supplies its
    /// own source through [`Match::new`].
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            player_count: DEFAULT_PLAYERS,
            starting_lives: STARTING_LIVES,
            turn_time: TURN_TIME,
            error_rate: ERROR_RATE,
            seed: None,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        // roster construction checks the count and lives bounds
        Roster::new(self.player_count, self.starting_lives)?;
        if self.turn_time.is_zero() {
            return Err(GameError::InvalidConfig(
                "turn time must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(GameError::InvalidConfig(format!(
                "error rate must be within [0, 1], got {}",
                self.error_rate
            )));
        }
        Ok(())
    }
}

/// Where the match currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    IntroSelecting(Roulette),
    IntroCountdown(Countdown),
    Active,
    Concluded,
}

/// Phase without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    IntroSelecting,
    IntroCountdown,
    Active,
    Concluded,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::IntroSelecting(_) => PhaseKind::IntroSelecting,
            Phase::IntroCountdown(_) => PhaseKind::IntroCountdown,
            Phase::Active => PhaseKind::Active,
            Phase::Concluded => PhaseKind::Concluded,
        }
    }
}

/// Why the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum OutcomeReason {
    WrongPass { target: u32 },
    WrongNumber { target: u32 },
    Timeout { target: u32 },
    Forfeit,
    Victory,
}

impl OutcomeReason {
    fn from_mistake(kind: MistakeKind, target: u32) -> Self {
        match kind {
            MistakeKind::WrongPass => OutcomeReason::WrongPass { target },
            MistakeKind::WrongNumber => OutcomeReason::WrongNumber { target },
            MistakeKind::Timeout => OutcomeReason::Timeout { target },
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            OutcomeReason::WrongPass { .. } => "wrong-pass",
            OutcomeReason::WrongNumber { .. } => "wrong-number",
            OutcomeReason::Timeout { .. } => "timeout",
            OutcomeReason::Forfeit => "forfeit",
            OutcomeReason::Victory => "victory",
        }
    }

    pub fn is_victory(&self) -> bool {
        matches!(self, OutcomeReason::Victory)
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeReason::WrongPass { target } => {
                write!(f, "Passed on {}, which was safe to say", target)
            }
            OutcomeReason::WrongNumber { target } => {
                write!(f, "Said {} out loud (it has a 7 or is a multiple of 7)", target)
            }
            OutcomeReason::Timeout { .. } => write!(f, "Too slow! Time ran out"),
            OutcomeReason::Forfeit => write!(f, "Tactical retreat"),
            OutcomeReason::Victory => write!(f, "Last one standing, victory!"),
        }
    }
}

/// Final result of a match. Set once, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub reason: OutcomeReason,
    /// Counter value when the match ended (the reached number)
    pub final_counter: u32,
    pub eliminated_opponents: usize,
}

impl Outcome {
    pub fn human_won(&self) -> bool {
        self.reason.is_victory()
    }
}

/// Everything a player needs to know to act on the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub seat: usize,
    pub counter: u32,
    pub target: u32,
    pub required: bool,
}

/// Who the match is waiting on after a new turn begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "seat_kind", rename_all = "snake_case")]
pub enum Prompt {
    /// Wait for external input
    Human(TurnView),
    /// Schedule a decision with [`Match::schedule_decision`]
    Automated(TurnView),
}

impl Prompt {
    pub fn view(&self) -> TurnView {
        match self {
            Prompt::Human(view) | Prompt::Automated(view) => *view,
        }
    }
}

/// Result of resolving one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub seat: usize,
    pub target: u32,
    pub action: Option<Action>,
    pub verdict: Verdict,
    pub lives_left: u8,
    pub eliminated: bool,
    /// Seat that plays next; `None` when the match concluded
    pub next_seat: Option<usize>,
}

/// What the caller has to do after poking the match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    /// Events to fire back into [`Match::handle_timer`] after their delay
    pub schedule: Vec<TimerEvent>,
    pub resolution: Option<Resolution>,
    pub prompt: Option<Prompt>,
    /// An automated seat is due to submit its action now
    pub decide: Option<TurnView>,
    pub concluded: Option<Outcome>,
    /// The fired event belonged to an earlier epoch and was ignored
    pub stale: bool,
}

impl Step {
    fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }

    fn scheduled(event: TimerEvent) -> Self {
        Self {
            schedule: vec![event],
            ..Self::default()
        }
    }
}

/// Serializable view of the match for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub phase: PhaseKind,
    pub counter: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_seat: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roulette_highlight: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownValue>,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub turn_time_ms: u64,
}

/// The turn/round state machine.
///
/// Owns the roster, the shared counter and the active seat. All changes go
/// through [`Match::start`], [`Match::handle_timer`], [`Match::submit`] and
/// [`Match::forfeit`]; each call either applies a whole transition or, on
/// error, leaves the match untouched.
///
/// # Examples
///
/// ```
/// use buzz7_engine::game::{Match, MatchConfig, PhaseKind};
/// use buzz7_engine::rng::SeededRng;
///
/// let mut game = Match::new(MatchConfig::default(), SeededRng::new_with_seed(7)).unwrap();
/// let mut pending = game.start().unwrap().schedule;
///
/// // Fire intro timers until play begins.
/// while game.phase().kind() != PhaseKind::Active {
///     let event = pending.remove(0);
///     pending.extend(game.handle_timer(&event).unwrap().schedule);
/// }
/// assert_eq!(game.counter(), 0);
/// ```
#[derive(Debug)]
pub struct Match<R: RandomSource> {
    config: MatchConfig,
    rng: R,
    roster: Roster,
    counter: u32,
    active: Option<usize>,
    phase: Phase,
    outcome: Option<Outcome>,
    timers: Timers,
    turns: Vec<TurnRecord>,
}

impl Match<SeededRng> {
    /// Builds the match with a ChaCha20 source seeded from `config.seed`,
    /// or from the OS when no seed is set.
    pub fn from_config(config: MatchConfig) -> Result<Self, GameError> {
        let rng = SeededRng::from_optional_seed(config.seed);
        Self::new(config, rng)
    }
}

impl<R: RandomSource> Match<R> {
    pub fn new(config: MatchConfig, rng: R) -> Result<Self, GameError> {
        config.validate()?;
        let roster = Roster::new(config.player_count, config.starting_lives)?;
        Ok(Self {
            config,
            rng,
            roster,
            counter: 0,
            active: None,
            phase: Phase::Idle,
            outcome: None,
            timers: Timers::default(),
            turns: Vec::new(),
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
    /// Seed of the random source in use, if it was seeded.
    pub fn seed(&self) -> Option<u64> {
        self.rng.seed()
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn counter(&self) -> u32 {
        self.counter
    }
    pub fn active_seat(&self) -> Option<usize> {
        self.active
    }
    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }
    pub fn epoch(&self) -> u64 {
        self.timers.epoch()
    }

    /// Starts a fresh match from `Idle` or after a previous one concluded.
    pub fn start(&mut self) -> Result<Step, GameError> {
        if !matches!(self.phase, Phase::Idle | Phase::Concluded) {
            return Err(GameError::MatchInProgress);
        }
        self.roster = Roster::new(self.config.player_count, self.config.starting_lives)?;
        self.counter = 0;
        self.active = None;
        self.outcome = None;
        self.turns.clear();
        self.timers.cancel_all();

        let winner = self.rng.pick_index(self.roster.len());
        self.phase = Phase::IntroSelecting(Roulette::new(winner, self.roster.len()));
        Ok(Step::scheduled(
            self.timers.schedule(TimerKind::RouletteStep, Duration::ZERO),
        ))
    }

    /// Applies a fired timer. Events from an older epoch are ignored.
    pub fn handle_timer(&mut self, event: &TimerEvent) -> Result<Step, GameError> {
        if !self.timers.is_current(event) {
            return Ok(Step::stale());
        }
        match (event.kind, self.phase) {
            (TimerKind::RouletteStep, Phase::IntroSelecting(mut spin)) => {
                match spin.advance() {
                    Some(pause) => {
                        self.phase = Phase::IntroSelecting(spin);
                        Ok(Step::scheduled(
                            self.timers.schedule(TimerKind::RouletteStep, pause),
                        ))
                    }
                    None => {
                        self.active = Some(spin.winner());
                        self.phase = Phase::IntroCountdown(Countdown::default());
                        self.timers.cancel_all();
                        Ok(Step::scheduled(
                            self.timers
                                .schedule(TimerKind::CountdownStep, COUNTDOWN_STEP),
                        ))
                    }
                }
            }
            (TimerKind::CountdownStep, Phase::IntroCountdown(mut countdown)) => {
                if countdown.tick() {
                    self.phase = Phase::IntroCountdown(countdown);
                    Ok(Step::scheduled(
                        self.timers
                            .schedule(TimerKind::CountdownStep, COUNTDOWN_STEP),
                    ))
                } else {
                    self.phase = Phase::Active;
                    self.timers.cancel_all();
                    self.begin_turn()
                }
            }
            (TimerKind::TurnTimeout, Phase::Active) => {
                let seat = self.current_seat()?;
                self.resolve(seat, None)
            }
            (TimerKind::AutomatedDecision, Phase::Active) => {
                let seat = self.current_seat()?;
                if self.roster.get(seat)?.is_human() {
                    return Ok(Step::stale());
                }
                Ok(Step {
                    decide: Some(self.view(seat)),
                    ..Step::default()
                })
            }
            _ => Ok(Step::stale()),
        }
    }

    /// Stamps the automated decision for the current turn. The delay comes
    /// from the automated player's tempo.
    pub fn schedule_decision(&self, delay: Duration) -> Result<TimerEvent, GameError> {
        self.ensure_active()?;
        let seat = self.current_seat()?;
        if self.roster.get(seat)?.is_human() {
            return Err(GameError::NotAutomatedSeat { seat });
        }
        Ok(self.timers.schedule(TimerKind::AutomatedDecision, delay))
    }

    /// Uniform draw in `[0, 1)` from the match's random source, used for
    /// automated mistakes so a seeded match replays exactly.
    pub fn draw(&mut self) -> f64 {
        self.rng.unit()
    }

    /// Submits a declaration from `seat`.
    ///
    /// Rejected without any state change unless the match is active and it
    /// is `seat`'s turn.
    pub fn submit(&mut self, seat: usize, action: Action) -> Result<Step, GameError> {
        self.ensure_active()?;
        let expected = self.current_seat()?;
        self.roster.get(seat)?;
        if seat != expected {
            return Err(GameError::NotPlayersTurn {
                expected,
                actual: seat,
            });
        }
        self.resolve(seat, Some(action))
    }

    /// Human walks away. Ends the match at once regardless of lives left.
    pub fn forfeit(&mut self, seat: usize) -> Result<Step, GameError> {
        self.ensure_active()?;
        if !self.roster.get(seat)?.is_human() {
            return Err(GameError::NotHumanSeat { seat });
        }
        self.roster.eliminate(seat)?;
        let outcome = self.conclude(OutcomeReason::Forfeit);
        Ok(Step {
            concluded: Some(outcome),
            ..Step::default()
        })
    }

    /// Human seat is always seat 0.
    pub fn human_seat(&self) -> usize {
        HUMAN_SEAT
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let (roulette_highlight, countdown) = match self.phase {
            Phase::IntroSelecting(spin) => (Some(spin.highlight()), None),
            Phase::IntroCountdown(c) => (None, Some(c.value())),
            _ => (None, None),
        };
        MatchSnapshot {
            phase: self.phase.kind(),
            counter: self.counter,
            active_seat: self.active,
            roulette_highlight,
            countdown,
            players: self.roster.players().to_vec(),
            outcome: self.outcome,
            turn_time_ms: self.config.turn_time.as_millis() as u64,
        }
    }

    pub fn record(&self, match_id: impl Into<String>) -> MatchRecord {
        MatchRecord::new(
            match_id,
            self.seed(),
            self.roster.len(),
            self.turns.clone(),
            self.outcome,
        )
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.phase == Phase::Active {
            Ok(())
        } else {
            Err(GameError::InputBlocked {
                phase: self.phase.kind(),
            })
        }
    }

    fn current_seat(&self) -> Result<usize, GameError> {
        self.active.ok_or(GameError::InputBlocked {
            phase: self.phase.kind(),
        })
    }

    fn view(&self, seat: usize) -> TurnView {
        let target = self.counter + 1;
        TurnView {
            seat,
            counter: self.counter,
            target,
            required: is_pass_required(target),
        }
    }

    fn begin_turn(&mut self) -> Result<Step, GameError> {
        let seat = self.current_seat()?;
        let view = self.view(seat);
        let prompt = if self.roster.get(seat)?.is_human() {
            Prompt::Human(view)
        } else {
            Prompt::Automated(view)
        };
        Ok(Step {
            schedule: vec![self
                .timers
                .schedule(TimerKind::TurnTimeout, self.config.turn_time)],
            prompt: Some(prompt),
            ..Step::default()
        })
    }

    /// Resolves the current turn as one unit. Works on a copy of the roster
    /// and commits only once the next seat is known.
    fn resolve(&mut self, seat: usize, action: Option<Action>) -> Result<Step, GameError> {
        let target = self.counter + 1;
        let required = is_pass_required(target);
        let verdict = judge(target, action);

        let mut roster = self.roster.clone();
        roster.record_action(seat, spoken(target, action), Utc::now())?;

        let mut lives_left = roster.get(seat)?.lives();
        let mut eliminated = false;
        let mut ending = None;
        if let Verdict::Mistake(kind) = verdict {
            lives_left = roster.apply_mistake(seat)?;
            if lives_left == 0 {
                roster.eliminate(seat)?;
                eliminated = true;
                if roster.get(seat)?.is_human() {
                    ending = Some(OutcomeReason::from_mistake(kind, target));
                } else if roster.human_is_sole_survivor() {
                    ending = Some(OutcomeReason::Victory);
                }
            }
        }

        let next_seat = match ending {
            Some(_) => None,
            None => Some(
                next_active(seat, &roster).ok_or(GameError::RosterExhausted { after: seat })?,
            ),
        };

        self.roster = roster;
        self.counter = target;
        self.timers.cancel_all();
        self.turns.push(TurnRecord {
            seat,
            target,
            action,
            required,
            verdict,
            lives_after: lives_left,
            eliminated,
        });

        let resolution = Resolution {
            seat,
            target,
            action,
            verdict,
            lives_left,
            eliminated,
            next_seat,
        };

        match ending {
            Some(reason) => Ok(Step {
                resolution: Some(resolution),
                concluded: Some(self.conclude(reason)),
                ..Step::default()
            }),
            None => {
                self.active = next_seat;
                let mut step = self.begin_turn()?;
                step.resolution = Some(resolution);
                Ok(step)
            }
        }
    }

    fn conclude(&mut self, reason: OutcomeReason) -> Outcome {
        self.timers.cancel_all();
        self.active = None;
        self.phase = Phase::Concluded;
        let outcome = Outcome {
            reason,
            final_counter: self.counter,
            eliminated_opponents: self.roster.eliminated_opponents(),
        };
        *self.outcome.get_or_insert(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_match(players: usize) -> Match<SeededRng> {
        let config = MatchConfig {
            player_count: players,
            ..MatchConfig::default()
        };
        let mut game = Match::new(config, SeededRng::new_with_seed(3)).expect("match");
        let mut pending = game.start().expect("start").schedule;
        while game.phase() != Phase::Active {
            let event = pending.remove(0);
            pending.extend(game.handle_timer(&event).expect("timer").schedule);
        }
        game
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MatchConfig {
            error_rate: 1.5,
            ..MatchConfig::default()
        };
        assert!(matches!(
            Match::new(config, SeededRng::new_with_seed(1)),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn input_is_blocked_during_intro() {
        let mut game = Match::new(MatchConfig::default(), SeededRng::new_with_seed(1))
            .expect("match");
        assert_eq!(
            game.submit(0, Action::DeclareNumber),
            Err(GameError::InputBlocked {
                phase: PhaseKind::Idle
            })
        );
        game.start().expect("start");
        assert!(game.submit(0, Action::DeclareNumber).is_err());
        assert!(game.forfeit(0).is_err());
        assert_eq!(game.counter(), 0);
    }

    #[test]
    fn wrong_seat_is_rejected_without_change() {
        let mut game = active_match(4);
        let seat = game.active_seat().expect("active");
        let other = (seat + 1) % 4;
        let before = game.snapshot();
        let err = game.submit(other, Action::DeclareNumber).unwrap_err();
        assert!(err.is_input_violation());
        assert_eq!(game.snapshot(), before);
    }

    struct FirstSeat;

    impl RandomSource for FirstSeat {
        fn pick_index(&mut self, _len: usize) -> usize {
            0
        }
        fn unit(&mut self) -> f64 {
            0.5
        }
    }

    #[test]
    fn record_reports_the_seed_of_the_source_in_use() {
        let config = MatchConfig {
            seed: Some(99),
            ..MatchConfig::default()
        };
        let scripted = Match::new(config.clone(), FirstSeat).expect("match");
        assert_eq!(scripted.record("m").seed, None);

        let other = Match::new(config.clone(), SeededRng::new_with_seed(5)).expect("match");
        assert_eq!(other.record("m").seed, Some(5));

        let seeded = Match::from_config(config).expect("match");
        assert_eq!(seeded.record("m").seed, Some(99));
    }

    #[test]
    fn from_config_replays_the_same_start() {
        let config = MatchConfig {
            seed: Some(21),
            ..MatchConfig::default()
        };
        let mut a = Match::from_config(config.clone()).expect("match");
        let mut b = Match::from_config(config).expect("match");
        assert_eq!(a.start(), b.start());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn start_is_refused_while_running() {
        let mut game = active_match(3);
        assert_eq!(game.start(), Err(GameError::MatchInProgress));
    }

    #[test]
    fn correct_declaration_advances_counter_and_seat() {
        let mut game = active_match(3);
        let seat = game.active_seat().expect("active");
        let step = game.submit(seat, Action::DeclareNumber).expect("submit");
        let resolution = step.resolution.expect("resolution");
        assert_eq!(resolution.verdict, Verdict::Correct);
        assert_eq!(game.counter(), 1);
        assert_eq!(game.active_seat(), Some((seat + 1) % 3));
        assert_eq!(step.schedule.len(), 1);
        assert_eq!(step.schedule[0].kind, TimerKind::TurnTimeout);
    }

    #[test]
    fn decision_is_refused_for_the_human_seat() {
        let mut game = active_match(2);
        if game.active_seat() != Some(HUMAN_SEAT) {
            let seat = game.active_seat().expect("active");
            game.submit(seat, Action::DeclareNumber).expect("submit");
        }
        assert_eq!(
            game.schedule_decision(Duration::from_millis(500)),
            Err(GameError::NotAutomatedSeat { seat: HUMAN_SEAT })
        );
    }
}
