//! Session directory: connected clients and their outbound queues.
//!
//! DESIGN
//! ======
//! Each websocket owns an mpsc receiver; the directory holds the matching
//! sender. Sends are non-blocking `try_send` so one slow client never stalls
//! the others. What happens when a queue is full depends on the event:
//! - move / resize: dropped. The next update for that element replaces it.
//! - anything else: the session is evicted. Its sender is removed, the
//!   websocket loop sees the queue close and hangs up, and the client
//!   reconnects and reloads the registry from `init`.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use events::ServerEvent;

/// Result of queueing one event for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue full and the event is superseded by later ones.
    Dropped,
    /// The session cannot keep up or is gone; it must be removed.
    Evict,
}

#[derive(Debug, Default)]
pub struct Directory {
    /// Join order is kept so `users` lists are stable.
    sessions: Vec<(Uuid, mpsc::Sender<ServerEvent>)>,
}

impl Directory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. A repeated id replaces the previous sender.
    pub fn join(&mut self, client_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        self.leave(client_id);
        self.sessions.push((client_id, tx));
    }

    /// Returns `true` if the session was registered.
    pub fn leave(&mut self, client_id: Uuid) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|(id, _)| *id != client_id);
        self.sessions.len() != before
    }

    /// Identities of every connected session, in join order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|(id, _)| id.to_string()).collect()
    }

    #[must_use]
    pub fn contains(&self, client_id: Uuid) -> bool {
        self.sessions.iter().any(|(id, _)| *id == client_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Queue `event` for one session. A session that cannot take it is
    /// evicted and `false` is returned.
    pub fn send_to(&mut self, client_id: Uuid, event: ServerEvent) -> bool {
        let Some((_, tx)) = self.sessions.iter().find(|(id, _)| *id == client_id) else {
            return false;
        };
        match deliver(client_id, tx, event) {
            Delivery::Queued => true,
            Delivery::Dropped => false,
            Delivery::Evict => {
                self.leave(client_id);
                false
            }
        }
    }

    /// Queue `event` for every session except `exclude`. Returns the
    /// sessions evicted because their queue could not take it.
    pub fn broadcast(&mut self, event: &ServerEvent, exclude: Option<Uuid>) -> Vec<Uuid> {
        let mut evicted = Vec::new();
        for (client_id, tx) in &self.sessions {
            if exclude == Some(*client_id) {
                continue;
            }
            if deliver(*client_id, tx, event.clone()) == Delivery::Evict {
                evicted.push(*client_id);
            }
        }
        for client_id in &evicted {
            self.leave(*client_id);
        }
        evicted
    }
}

fn deliver(client_id: Uuid, tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) -> Delivery {
    match tx.try_send(event) {
        Ok(()) => Delivery::Queued,
        Err(TrySendError::Full(event)) if event.is_superseded_by_later() => {
            debug!(
                %client_id,
                event = event.name(),
                "directory: client queue full, update dropped"
            );
            Delivery::Dropped
        }
        Err(TrySendError::Full(event)) => {
            warn!(
                %client_id,
                event = event.name(),
                "directory: client queue full, evicting session"
            );
            Delivery::Evict
        }
        Err(TrySendError::Closed(_)) => {
            debug!(%client_id, "directory: client queue closed");
            Delivery::Evict
        }
    }
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;
