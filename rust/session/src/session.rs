use crate::commentary::{Commentary, CommentaryClient, CommentaryRequest};
use crate::events::{EventBus, MatchEvent, PlayerInfo};
use crate::settings::{Settings, SettingsError};
use buzz7_ai::{create_ai_with_tempo, AutomatedPlayer};
use buzz7_engine::errors::GameError;
use buzz7_engine::game::{Match, MatchConfig, MatchSnapshot, Outcome, Phase, Prompt, Step};
use buzz7_engine::player::Action;
use buzz7_engine::rng::SeededRng;
use buzz7_engine::rules::spoken;
use buzz7_engine::timer::{TimerEvent, TimerKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

pub type SessionId = String;

const COMMAND_BUFFER: usize = 64;
const TIMER_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(GameError),
    #[error("Input rejected: {0}")]
    Rejected(GameError),
    #[error("Match faulted: {0}")]
    Faulted(GameError),
    #[error("Session {0} is closed")]
    Closed(SessionId),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl SessionError {
    pub fn game_error(&self) -> Option<&GameError> {
        match self {
            SessionError::InvalidConfig(err)
            | SessionError::Rejected(err)
            | SessionError::Faulted(err) => Some(err),
            _ => None,
        }
    }
}

type Responder = oneshot::Sender<Result<(), SessionError>>;

#[derive(Debug)]
enum SessionCommand {
    Start(Responder),
    Declare(Action, Responder),
    Forfeit(Responder),
    Shutdown,
}

/// What the display reads between events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub match_id: SessionId,
    pub snapshot: MatchSnapshot,
    /// Time left on the running turn clock
    pub turn_time_left_ms: Option<u64>,
    /// Speech bubble per seat, present while still visible
    pub bubbles: Vec<Option<String>>,
    pub commentary: Option<Commentary>,
    pub fault: Option<String>,
}

#[derive(Debug)]
struct SharedState {
    round: u64,
    snapshot: MatchSnapshot,
    turn_deadline: Option<Instant>,
    commentary: Option<Commentary>,
    fault: Option<String>,
}

/// Cheap handle for driving a running [`MatchSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    match_id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    shared: Arc<RwLock<SharedState>>,
}

impl SessionHandle {
    pub fn match_id(&self) -> &SessionId {
        &self.match_id
    }

    /// Starts the match, or a rematch once the previous one concluded.
    pub async fn start(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Start).await
    }

    pub async fn declare_number(&self) -> Result<(), SessionError> {
        self.request(|respond| SessionCommand::Declare(Action::DeclareNumber, respond))
            .await
    }

    pub async fn declare_pass(&self) -> Result<(), SessionError> {
        self.request(|respond| SessionCommand::Declare(Action::DeclarePass, respond))
            .await
    }

    pub async fn forfeit(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Forfeit).await
    }

    /// Stops the driver. Pending timers are dropped.
    pub async fn shutdown(&self) {
        if self.commands.send(SessionCommand::Shutdown).await.is_err() {
            tracing::debug!(match_id = %self.match_id, "session already stopped");
        }
    }

    pub fn view(&self) -> SessionView {
        let state = self.shared.read().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        SessionView {
            match_id: self.match_id.clone(),
            snapshot: state.snapshot.clone(),
            turn_time_left_ms: state.turn_deadline.map(|deadline| {
                deadline.saturating_duration_since(Instant::now()).as_millis() as u64
            }),
            bubbles: state
                .snapshot
                .players
                .iter()
                .map(|player| {
                    player
                        .last_action()
                        .filter(|action| action.is_visible(now))
                        .map(|action| action.text.clone())
                })
                .collect(),
            commentary: state.commentary.clone(),
            fault: state.fault.clone(),
        }
    }

    async fn request<F>(&self, make: F) -> Result<(), SessionError>
    where
        F: FnOnce(Responder) -> SessionCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed(self.match_id.clone()))?;
        rx.await
            .map_err(|_| SessionError::Closed(self.match_id.clone()))?
    }
}

/// Async driver around one [`Match`].
///
/// Owns the match and is the only thing that touches it. Commands from
/// [`SessionHandle`]s and fired timers are handled one at a time, so every
/// transition is serialized. Timers sleep on their own tasks and come back
/// through a channel; the match ignores the ones whose epoch has passed.
pub struct MatchSession {
    id: SessionId,
    game: Match<SeededRng>,
    policy: Box<dyn AutomatedPlayer>,
    commentary: CommentaryClient,
    bus: EventBus,
    inbox: mpsc::Receiver<SessionCommand>,
    fired_tx: mpsc::Sender<TimerEvent>,
    fired_rx: mpsc::Receiver<TimerEvent>,
    pending: Vec<JoinHandle<()>>,
    turn_deadline: Option<Instant>,
    round: u64,
    fault: Option<GameError>,
    shared: Arc<RwLock<SharedState>>,
}

impl MatchSession {
    pub fn new(
        config: MatchConfig,
        policy: Box<dyn AutomatedPlayer>,
        commentary: CommentaryClient,
        bus: EventBus,
    ) -> Result<(Self, SessionHandle), SessionError> {
        let game = Match::from_config(config).map_err(SessionError::InvalidConfig)?;
        let id = Uuid::new_v4().to_string();

        let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
        let (fired_tx, fired_rx) = mpsc::channel(TIMER_BUFFER);
        let shared = Arc::new(RwLock::new(SharedState {
            round: 0,
            snapshot: game.snapshot(),
            turn_deadline: None,
            commentary: None,
            fault: None,
        }));

        tracing::info!(
            match_id = %id,
            players = game.roster().len(),
            seed = ?game.seed(),
            ai = policy.name(),
            "creating match session"
        );

        let handle = SessionHandle {
            match_id: id.clone(),
            commands,
            shared: Arc::clone(&shared),
        };
        let session = Self {
            id,
            game,
            policy,
            commentary,
            bus,
            inbox,
            fired_tx,
            fired_rx,
            pending: Vec::new(),
            turn_deadline: None,
            round: 0,
            fault: None,
            shared,
        };
        Ok((session, handle))
    }

    pub fn from_settings(
        settings: &Settings,
        commentary: CommentaryClient,
        bus: EventBus,
    ) -> Result<(Self, SessionHandle), SessionError> {
        settings.validate()?;
        let policy = create_ai_with_tempo(&settings.ai, settings.error_rate, settings.tempo());
        Self::new(settings.match_config(), policy, commentary, bus)
    }

    pub fn match_id(&self) -> &SessionId {
        &self.id
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!(match_id = %self.id, "match session running");

        while self.fault.is_none() {
            tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.fired_rx.recv() => {
                    self.on_timer(event);
                    self.publish();
                }
            }
        }

        self.disarm();
        self.publish();
        // subscribers see their channel close after the last event
        self.bus.drop_match(&self.id);
        tracing::info!(match_id = %self.id, "match session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        let (result, respond) = match command {
            SessionCommand::Start(respond) => (self.start(), respond),
            SessionCommand::Declare(action, respond) => {
                let result = self.game.submit(self.game.human_seat(), action);
                (self.settle(result), respond)
            }
            SessionCommand::Forfeit(respond) => {
                let result = self.game.forfeit(self.game.human_seat());
                (self.settle(result), respond)
            }
            SessionCommand::Shutdown => return,
        };
        // the caller may read the view as soon as it hears back
        self.publish();
        let _ = respond.send(result);
    }

    fn start(&mut self) -> Result<(), SessionError> {
        let result = self.game.start();
        if result.is_ok() {
            self.disarm();
            self.round += 1;
            {
                let mut state = self.shared.write().unwrap_or_else(PoisonError::into_inner);
                state.round = self.round;
                state.commentary = None;
            }
            tracing::info!(match_id = %self.id, round = self.round, "match started");
            let players = self
                .game
                .roster()
                .players()
                .iter()
                .map(PlayerInfo::from)
                .collect();
            self.broadcast(MatchEvent::MatchStarted {
                match_id: self.id.clone(),
                players,
            });
        }
        self.settle(result)
    }

    fn on_timer(&mut self, event: TimerEvent) {
        let result = self.game.handle_timer(&event);
        let intro = matches!(event.kind, TimerKind::RouletteStep | TimerKind::CountdownStep);
        if intro && matches!(&result, Ok(step) if !step.stale) {
            self.announce_intro();
        }
        // rejections are already logged and there is nobody to answer
        let _ = self.settle(result);
    }

    /// Applies a transition result. Rejected input leaves the match as it
    /// was; anything else the engine refuses faults the session.
    fn settle(&mut self, result: Result<Step, GameError>) -> Result<(), SessionError> {
        match result {
            Ok(step) => {
                self.apply(step);
                match &self.fault {
                    Some(err) => Err(SessionError::Faulted(err.clone())),
                    None => Ok(()),
                }
            }
            Err(err) if err.is_input_violation() => {
                tracing::debug!(match_id = %self.id, error = %err, "ignoring rejected input");
                Err(SessionError::Rejected(err))
            }
            Err(err) => {
                self.fault(err.clone());
                Err(SessionError::Faulted(err))
            }
        }
    }

    fn apply(&mut self, step: Step) {
        if step.stale {
            tracing::trace!(match_id = %self.id, "stale timer ignored");
            return;
        }

        let mut schedule = step.schedule;

        if let Some(resolution) = step.resolution {
            // resolving bumped the epoch, so everything in flight is stale
            self.disarm();
            tracing::info!(
                match_id = %self.id,
                seat = resolution.seat,
                target = resolution.target,
                verdict = ?resolution.verdict,
                lives_left = resolution.lives_left,
                "turn resolved"
            );
            self.broadcast(MatchEvent::TurnResolved {
                match_id: self.id.clone(),
                resolution,
                call: spoken(resolution.target, resolution.action),
            });
            if resolution.eliminated {
                tracing::info!(match_id = %self.id, seat = resolution.seat, "player eliminated");
                self.broadcast(MatchEvent::PlayerEliminated {
                    match_id: self.id.clone(),
                    seat: resolution.seat,
                });
            }
        }

        if let Some(prompt) = step.prompt {
            let view = prompt.view();
            self.broadcast(MatchEvent::TurnStarted {
                match_id: self.id.clone(),
                seat: view.seat,
                target: view.target,
                is_human: matches!(prompt, Prompt::Human(_)),
                time_limit_ms: self.game.config().turn_time.as_millis() as u64,
            });
            if let Prompt::Automated(view) = prompt {
                let delay = self.policy.think_time(view.counter);
                match self.game.schedule_decision(delay) {
                    Ok(event) => schedule.push(event),
                    Err(err) => {
                        self.fault(err);
                        return;
                    }
                }
            }
        }

        self.arm(schedule);

        if let Some(view) = step.decide {
            let draw = self.game.draw();
            let action = self.policy.decide(&view, draw);
            tracing::debug!(
                match_id = %self.id,
                seat = view.seat,
                target = view.target,
                action = ?action,
                "automated player answered"
            );
            let result = self.game.submit(view.seat, action);
            let _ = self.settle(result);
        }

        if let Some(outcome) = step.concluded {
            self.conclude(outcome);
        }
    }

    fn announce_intro(&self) {
        let event = match self.game.phase() {
            Phase::IntroSelecting(spin) => MatchEvent::RouletteTick {
                match_id: self.id.clone(),
                highlight: spin.highlight(),
            },
            Phase::IntroCountdown(countdown) => MatchEvent::CountdownTick {
                match_id: self.id.clone(),
                value: countdown.value(),
            },
            _ => return,
        };
        self.broadcast(event);
    }

    fn arm(&mut self, events: Vec<TimerEvent>) {
        if events.is_empty() {
            return;
        }
        self.pending.retain(|task| !task.is_finished());
        for event in events {
            if event.kind == TimerKind::TurnTimeout {
                self.turn_deadline = Some(Instant::now() + event.delay);
            }
            let fired = self.fired_tx.clone();
            self.pending.push(tokio::spawn(async move {
                tokio::time::sleep(event.delay).await;
                // fails only once the session has stopped
                let _ = fired.send(event).await;
            }));
        }
    }

    fn disarm(&mut self) {
        for task in self.pending.drain(..) {
            task.abort();
        }
        self.turn_deadline = None;
    }

    fn conclude(&mut self, outcome: Outcome) {
        self.disarm();
        tracing::info!(
            match_id = %self.id,
            reason = outcome.reason.code(),
            final_counter = outcome.final_counter,
            eliminated_opponents = outcome.eliminated_opponents,
            human_won = outcome.human_won(),
            "match concluded"
        );
        match self.game.record(self.id.clone()).to_json_line() {
            Ok(line) => tracing::info!(match_id = %self.id, record = %line, "match record"),
            Err(err) => {
                tracing::warn!(match_id = %self.id, error = %err, "failed to serialize match record")
            }
        }
        self.broadcast(MatchEvent::MatchConcluded {
            match_id: self.id.clone(),
            outcome,
            summary: summarize(&outcome, self.game.roster().len()),
        });
        self.request_commentary(&outcome);
    }

    /// Fire-and-forget. The result only lands if no rematch started meanwhile.
    fn request_commentary(&self, outcome: &Outcome) {
        let client = self.commentary.clone();
        let request = CommentaryRequest::from(outcome);
        let bus = self.bus.clone();
        let shared = Arc::clone(&self.shared);
        let match_id = self.id.clone();
        let round = self.round;

        tokio::spawn(async move {
            let commentary = tokio::task::spawn_blocking(move || client.commentate(&request))
                .await
                .unwrap_or_else(|err| {
                    tracing::warn!(match_id = %match_id, error = %err, "commentary task failed");
                    Commentary::failure()
                });
            {
                let mut state = shared.write().unwrap_or_else(PoisonError::into_inner);
                if state.round != round {
                    tracing::debug!(match_id = %match_id, round, "dropping commentary for an earlier round");
                    return;
                }
                state.commentary = Some(commentary.clone());
            }
            bus.broadcast(
                &match_id,
                MatchEvent::CommentaryReady {
                    match_id: match_id.clone(),
                    commentary,
                },
            );
        });
    }

    fn fault(&mut self, err: GameError) {
        tracing::error!(match_id = %self.id, error = %err, "match faulted");
        self.disarm();
        self.broadcast(MatchEvent::Fault {
            match_id: self.id.clone(),
            message: err.to_string(),
        });
        self.fault = Some(err);
    }

    fn publish(&self) {
        let mut state = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = self.game.snapshot();
        state.turn_deadline = self.turn_deadline;
        state.fault = self.fault.as_ref().map(ToString::to_string);
    }

    fn broadcast(&self, event: MatchEvent) {
        self.bus.broadcast(&self.id, event);
    }
}

/// One-line match summary: how it ended, the number reached and the
/// opponents knocked out.
pub fn summarize(outcome: &Outcome, players: usize) -> String {
    format!(
        "{} (reached {}, knocked out {} of {} opponents)",
        outcome.reason,
        outcome.final_counter,
        outcome.eliminated_opponents,
        players.saturating_sub(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzz7_engine::game::OutcomeReason;

    #[test]
    fn summary_reports_count_and_knockouts() {
        let outcome = Outcome {
            reason: OutcomeReason::Victory,
            final_counter: 42,
            eliminated_opponents: 3,
        };
        assert_eq!(
            summarize(&outcome, 4),
            "Last one standing, victory! (reached 42, knocked out 3 of 3 opponents)"
        );
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = MatchConfig {
            player_count: 1,
            ..MatchConfig::default()
        };
        let result = MatchSession::new(
            config,
            buzz7_ai::create_ai("baseline", 0.2),
            CommentaryClient::unconfigured(),
            EventBus::new(),
        );
        assert!(matches!(
            result,
            Err(SessionError::InvalidConfig(GameError::InvalidConfig(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn fault_cancels_timers_and_stops_the_driver() {
        let bus = EventBus::new();
        let (mut session, handle) = MatchSession::new(
            MatchConfig {
                player_count: 3,
                seed: Some(8),
                ..MatchConfig::default()
            },
            buzz7_ai::create_ai("baseline", 0.2),
            CommentaryClient::unconfigured(),
            bus.clone(),
        )
        .expect("session");
        let mut events = bus.subscribe(handle.match_id().clone());

        session.start().expect("start");
        assert!(!session.pending.is_empty());

        session.fault(GameError::RosterExhausted { after: 1 });
        assert!(session.pending.is_empty());
        assert_eq!(session.turn_deadline, None);

        // returns without waiting for a command
        session.run().await;

        let mut kinds = Vec::new();
        while let Some(event) = events.receiver.recv().await {
            kinds.push(event.kind());
        }
        assert_eq!(kinds, vec!["match_started", "fault"]);
        assert_eq!(bus.subscriber_count(), 0);

        let view = handle.view();
        assert_eq!(
            view.fault.as_deref(),
            Some("No eligible player left after seat 1")
        );
        assert!(matches!(
            handle.declare_pass().await,
            Err(SessionError::Closed(_))
        ));
    }

    #[test]
    fn rejected_errors_expose_the_game_error() {
        let err = SessionError::Rejected(GameError::MatchInProgress);
        assert_eq!(err.game_error(), Some(&GameError::MatchInProgress));
        assert!(SessionError::Closed("m".into()).game_error().is_none());
    }
}
