use crate::protocol::{Event, EventEnvelope};
use crate::state::AppState;
use crate::types::{GameId, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Millisecond wall clock that never repeats or goes backwards
#[derive(Debug, Default)]
pub struct EventClock {
    last: AtomicI64,
}

impl EventClock {
    pub fn now(&self) -> i64 {
        let wall = chrono::Utc::now().timestamp_millis();
        let prev = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        wall.max(prev + 1)
    }
}

/// One broadcast channel per game, created on first use
#[derive(Debug)]
pub struct Broadcaster {
    channels: RwLock<HashMap<GameId, broadcast::Sender<EventEnvelope>>>,
    capacity: usize,
    clock: EventClock,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
            clock: EventClock::default(),
        }
    }

    pub async fn subscribe(&self, game_id: &str) -> broadcast::Receiver<EventEnvelope> {
        if let Some(tx) = self.channels.read().await.get(game_id) {
            return tx.subscribe();
        }
        let mut channels = self.channels.write().await;
        channels
            .entry(game_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Stamp and publish an event. Delivery is best effort: a game
    /// nobody listens to simply drops it.
    pub async fn emit(&self, session_id: &SessionId, game_id: &str, event: Event) -> EventEnvelope {
        let envelope = EventEnvelope {
            event,
            timestamp: self.clock.now(),
            session_id: session_id.clone(),
        };

        let delivered = match self.channels.read().await.get(game_id) {
            Some(tx) => tx.send(envelope.clone()).unwrap_or(0),
            None => 0,
        };
        tracing::debug!(
            game_id = %game_id,
            kind = %envelope.event.kind(),
            timestamp = envelope.timestamp,
            delivered,
            "Event emitted"
        );
        envelope
    }

    /// Drop channels without subscribers. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

/// Spawn a background task that periodically drops idle game channels
pub fn spawn_channel_pruner(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(PRUNE_INTERVAL).await;
            let removed = state.broadcaster.prune().await;
            if removed > 0 {
                tracing::debug!(removed, "Pruned idle game channels");
            }
        }
    });
}
