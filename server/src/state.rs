//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the config and a single [`Stage`] behind a mutex. Every connection
//! event and intent takes the lock, mutates the registry, and queues its
//! broadcast before releasing it, so all clients observe mutations in the
//! same order the registry applied them.
//!
//! Queueing is `try_send` into per-client channels and never awaits, so the
//! lock is held only for in-memory work. A client whose queue overflows on
//! anything but a move or resize is evicted and announced with `user-left`;
//! its socket closes and it rejoins from a fresh `init`.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use events::{ClientEvent, Hello, ServerEvent};

use crate::config::Config;
use crate::directory::Directory;
use crate::registry::Registry;
use crate::router::{self, BroadcastDecision};

// =============================================================================
// STAGE
// =============================================================================

/// The registry plus everyone watching it.
#[derive(Debug, Default)]
pub struct Stage {
    pub registry: Registry,
    pub directory: Directory,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: Registry::new(), directory: Directory::new() }
    }

    /// Admit a client: `hello` and `init` to it, then `users` to everyone.
    ///
    /// The snapshot is queued before the client's sender is visible to any
    /// broadcast, so the client never sees a relayed intent ahead of `init`.
    /// Returns `false` if the handshake did not fit the client's queue; the
    /// client is then not registered and peers hear nothing.
    pub fn connect(&mut self, client_id: Uuid, tx: mpsc::Sender<ServerEvent>) -> bool {
        let hello = ServerEvent::Hello(Hello { client_id: client_id.to_string() });
        let init = ServerEvent::Init(self.registry.snapshot());
        self.directory.join(client_id, tx);
        let queued =
            self.directory.send_to(client_id, hello) && self.directory.send_to(client_id, init);
        if !queued {
            self.directory.leave(client_id);
            warn!(%client_id, "stage: handshake did not fit client queue, join refused");
            return false;
        }
        self.fan_out(&ServerEvent::Users(self.directory.ids()), None);
        info!(
            %client_id,
            clients = self.directory.len(),
            elements = self.registry.len(),
            "stage: client joined"
        );
        self.directory.contains(client_id)
    }

    /// Route one intent and relay the result to everyone but `origin`.
    pub fn handle_intent(&mut self, origin: Uuid, event: ClientEvent) -> BroadcastDecision {
        let decision = router::route(&mut self.registry, origin, event);
        if let BroadcastDecision::Relay(relay) = &decision {
            self.fan_out(relay, Some(origin));
        }
        decision
    }

    /// Forget a client. Its elements stay on the stage.
    pub fn disconnect(&mut self, client_id: Uuid) {
        if self.directory.leave(client_id) {
            self.fan_out(&ServerEvent::UserLeft(client_id.to_string()), None);
            info!(%client_id, clients = self.directory.len(), "stage: client left");
            if self.directory.is_empty() && !self.registry.is_empty() {
                debug!(elements = self.registry.len(), "stage: stage idle, elements retained");
            }
        }
    }

    /// Broadcast `event` and announce every session evicted along the way.
    /// An announcement can itself evict another lagging session.
    fn fan_out(&mut self, event: &ServerEvent, exclude: Option<Uuid>) {
        let mut pending = VecDeque::from([(event.clone(), exclude)]);
        while let Some((event, exclude)) = pending.pop_front() {
            for client_id in self.directory.broadcast(&event, exclude) {
                info!(%client_id, clients = self.directory.len(), "stage: lagging client evicted");
                pending.push_back((ServerEvent::UserLeft(client_id.to_string()), None));
            }
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub stage: Arc<Mutex<Stage>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { stage: Arc::new(Mutex::new(Stage::new())), config: Arc::new(config) }
    }
}


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
