// THEORY:
// The engine reports progress once per round and never waits for anyone to listen.
// A `ProgressSink` is whatever the caller hands in: an mpsc sender, a broadcast
// sender, `()` to discard, or a `SessionHub` that keeps one broadcast channel per
// session so several observers can follow the same run. Buffering, fan-out and
// connection lifetime all live on the sink side; a failed send is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

pub const MUTATION_EVENT: &str = "mutation";

/// One progress notification, emitted after each round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub name: String,
    /// Zero-based index of the round that just finished.
    pub progress: usize,
    pub total: usize,
}

impl ProgressEvent {
    pub fn mutation(progress: usize, total: usize) -> Self {
        Self {
            name: MUTATION_EVENT.to_string(),
            progress,
            total,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Fire-and-forget receiver of progress events.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

impl ProgressSink for () {
    fn notify(&self, _event: ProgressEvent) {}
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn notify(&self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}

impl ProgressSink for broadcast::Sender<ProgressEvent> {
    fn notify(&self, event: ProgressEvent) {
        // No subscribers is not an error for us.
        let _ = self.send(event);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn notify(&self, event: ProgressEvent) {
        (**self).notify(event);
    }
}

/// Per-session broadcasters for progress events.
#[derive(Clone)]
pub struct SessionHub {
    capacity: usize,
    sessions: Arc<Mutex<HashMap<String, broadcast::Sender<ProgressEvent>>>>,
}

impl SessionHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribes to `session_id`, creating the session on first use.
    pub fn subscribe(&self, session_id: &str) -> broadcast::Receiver<ProgressEvent> {
        self.sender(session_id).subscribe()
    }

    /// Sink that publishes into `session_id`.
    pub fn session(&self, session_id: &str) -> SessionSink {
        SessionSink {
            sender: self.sender(session_id),
        }
    }

    /// Drops the session; subscribers see the channel close once no sink is left.
    pub fn close(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn sender(&self, session_id: &str) -> broadcast::Sender<ProgressEvent> {
        let capacity = self.capacity;
        self.lock()
            .entry(session_id.to_string())
            .or_insert_with(|| {
                log::debug!("opening progress session {session_id}");
                broadcast::channel(capacity).0
            })
            .clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<ProgressEvent>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Publishing half of one hub session.
#[derive(Clone)]
pub struct SessionSink {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressSink for SessionSink {
    fn notify(&self, event: ProgressEvent) {
        self.sender.notify(event);
    }
}
