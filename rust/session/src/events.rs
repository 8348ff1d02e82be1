use crate::commentary::Commentary;
use crate::session::SessionId;
use buzz7_engine::game::{Outcome, Resolution};
use buzz7_engine::intro::CountdownValue;
use buzz7_engine::player::Player;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

// Bounded so a stalled subscriber cannot grow memory; it gets pruned instead.
const EVENT_CHANNEL_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<MatchEvent>;
pub type EventReceiver = mpsc::Receiver<MatchEvent>;

pub struct EventSubscription {
    bus: EventBus,
    match_id: SessionId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.match_id, self.subscriber_id);
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<SessionId, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, match_id: SessionId) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(match_id.clone());
        EventSubscription {
            bus: self.clone(),
            match_id,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, match_id: SessionId) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.entry(match_id.clone()).or_default().push((id, tx));

        tracing::info!(
            match_id = %match_id,
            subscriber_id = id,
            "subscribed to match events"
        );

        (id, rx)
    }

    pub fn broadcast(&self, match_id: &SessionId, event: MatchEvent) {
        tracing::debug!(
            match_id = %match_id,
            event_type = event.kind(),
            "broadcasting match event"
        );

        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard.get(match_id).cloned()
        };

        let Some(list) = subscribers else {
            tracing::trace!(match_id = %match_id, "no subscribers for match");
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            // never wait on a slow subscriber
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    match_id = %match_id,
                    subscriber_id = id,
                    error = ?e,
                    "failed to deliver event, dropping subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(match_id, &failed);
        }
    }

    pub fn unsubscribe(&self, match_id: &SessionId, subscriber_id: usize) {
        self.remove_subscribers(match_id, &[subscriber_id]);
    }

    /// Removes every subscriber of a match. Their receivers see the channel
    /// close once the buffered events are drained.
    pub fn drop_match(&self, match_id: &SessionId) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(match_id);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.values().map(|list| list.len()).sum()
    }

    fn remove_subscribers(&self, match_id: &SessionId, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = guard.get_mut(match_id) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(match_id);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchStarted {
        match_id: SessionId,
        players: Vec<PlayerInfo>,
    },
    RouletteTick {
        match_id: SessionId,
        highlight: usize,
    },
    CountdownTick {
        match_id: SessionId,
        value: CountdownValue,
    },
    TurnStarted {
        match_id: SessionId,
        seat: usize,
        target: u32,
        is_human: bool,
        time_limit_ms: u64,
    },
    TurnResolved {
        match_id: SessionId,
        resolution: Resolution,
        /// What the seat said out loud
        call: String,
    },
    PlayerEliminated {
        match_id: SessionId,
        seat: usize,
    },
    MatchConcluded {
        match_id: SessionId,
        outcome: Outcome,
        summary: String,
    },
    CommentaryReady {
        match_id: SessionId,
        commentary: Commentary,
    },
    Fault {
        match_id: SessionId,
        message: String,
    },
}

impl MatchEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MatchEvent::MatchStarted { .. } => "match_started",
            MatchEvent::RouletteTick { .. } => "roulette_tick",
            MatchEvent::CountdownTick { .. } => "countdown_tick",
            MatchEvent::TurnStarted { .. } => "turn_started",
            MatchEvent::TurnResolved { .. } => "turn_resolved",
            MatchEvent::PlayerEliminated { .. } => "player_eliminated",
            MatchEvent::MatchConcluded { .. } => "match_concluded",
            MatchEvent::CommentaryReady { .. } => "commentary_ready",
            MatchEvent::Fault { .. } => "fault",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: usize,
    pub lives: u8,
    pub is_human: bool,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id(),
            lives: player.lives(),
            is_human: player.is_human(),
        }
    }
}
