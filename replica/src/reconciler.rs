//! Reconciler: keeps the local replica consistent with the server registry.
//!
//! DESIGN
//! ======
//! Two inputs mutate the replica:
//! - Remote: [`ServerEvent`]s pushed by the server, applied with
//!   last-write-wins semantics. Events for elements that are not rendered are
//!   dropped, never treated as errors.
//! - Local: intents originated by this participant. They are applied to the
//!   replica first (optimistic) and the caller receives the [`ClientEvent`] to
//!   send. Nothing is sent for an intent the replica itself rejects.
//!
//! The server never relays a sender's own intent back to it. If a transport
//! did, spawn/move/resize are idempotent here and filter echoes are dropped by
//! comparing `senderId` with this session's identity.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;

use events::{
    ClientEvent, DeleteIntent, ElementRecord, FilterIntent, Filters, MoveIntent, ResizeIntent,
    ServerEvent, SpawnIntent,
};
use tracing::debug;

use crate::store::{LocalElement, ReplicaStore};

// =============================================================================
// RENDER SEAM
// =============================================================================

/// Transport connectivity as seen by the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Host-side visual layer. Receives canonical state, never intents.
pub trait Renderer {
    /// An element became visible.
    fn mount(&mut self, element: &LocalElement);
    /// A visible element's state changed; redraw it from `element`.
    fn update(&mut self, element: &LocalElement);
    /// An element must disappear.
    fn unmount(&mut self, id: &str);
    /// Every element must disappear (a snapshot follows).
    fn clear(&mut self);
    /// Peer identities changed. Consumed by the peer-video layer.
    fn presence(&mut self, _peers: &[String]) {}
    /// Connectivity changed.
    fn connection(&mut self, _status: ConnectionStatus) {}
}

/// A renderer that draws nothing. Useful for headless replicas.
impl Renderer for () {
    fn mount(&mut self, _element: &LocalElement) {}
    fn update(&mut self, _element: &LocalElement) {}
    fn unmount(&mut self, _id: &str) {}
    fn clear(&mut self) {}
}

/// What applying a remote event did to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The replica (or session metadata) changed.
    Applied,
    /// Spawn for an id that is already rendered.
    AlreadyRendered,
    /// Mutation for an id that is not rendered.
    Missing,
    /// Filter update originated by this session.
    EchoSuppressed,
}

// =============================================================================
// RECONCILER
// =============================================================================

pub struct Reconciler<R: Renderer> {
    store: ReplicaStore,
    renderer: R,
    identity: Option<String>,
    peers: Vec<String>,
    status: ConnectionStatus,
}

impl<R: Renderer> Reconciler<R> {
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self {
            store: ReplicaStore::new(),
            renderer,
            identity: None,
            peers: Vec::new(),
            status: ConnectionStatus::Disconnected,
        }
    }

    /// This session's identity, once the server has sent `hello`.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    #[must_use]
    pub fn store(&self) -> &ReplicaStore {
        &self.store
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Other connected sessions, excluding this one.
    #[must_use]
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            self.renderer.connection(status);
        }
    }

    // --- Remote events ---

    /// Apply one event pushed by the server.
    pub fn apply_remote(&mut self, event: ServerEvent) -> Reconciled {
        match event {
            ServerEvent::Hello(hello) => {
                self.identity = Some(hello.client_id);
                Reconciled::Applied
            }
            ServerEvent::Init(records) => {
                self.load_snapshot(records);
                Reconciled::Applied
            }
            ServerEvent::Users(users) => {
                self.peers = users
                    .into_iter()
                    .filter(|id| Some(id.as_str()) != self.identity.as_deref())
                    .collect();
                self.renderer.presence(&self.peers);
                Reconciled::Applied
            }
            ServerEvent::UserLeft(id) => {
                self.peers.retain(|peer| *peer != id);
                self.renderer.presence(&self.peers);
                Reconciled::Applied
            }
            ServerEvent::Spawn(record) => self.render_new(record),
            ServerEvent::Move(intent) => {
                match self.store.set_position(&intent.id, intent.x, intent.y) {
                    Some(el) => {
                        self.renderer.update(el);
                        Reconciled::Applied
                    }
                    None => missing("move", &intent.id),
                }
            }
            ServerEvent::Resize(intent) => {
                match self.store.set_size(&intent.id, intent.width, intent.height) {
                    Some(el) => {
                        self.renderer.update(el);
                        Reconciled::Applied
                    }
                    None => missing("resize", &intent.id),
                }
            }
            ServerEvent::Filter(intent) => {
                if self.identity.as_deref() == Some(intent.sender_id.as_str()) {
                    debug!(id = %intent.id, "replica: suppressed filter echo");
                    return Reconciled::EchoSuppressed;
                }
                match self.store.set_filters(&intent.id, intent.filters) {
                    Some(el) => {
                        self.renderer.update(el);
                        Reconciled::Applied
                    }
                    None => missing("filter", &intent.id),
                }
            }
            ServerEvent::Delete(intent) => {
                if self.store.remove(&intent.id).is_some() {
                    self.renderer.unmount(&intent.id);
                    Reconciled::Applied
                } else {
                    missing("delete", &intent.id)
                }
            }
        }
    }

    fn load_snapshot(&mut self, records: Vec<ElementRecord>) {
        self.store.load_snapshot(records);
        self.renderer.clear();
        for el in self.store.iter() {
            self.renderer.mount(el);
        }
        debug!(count = self.store.len(), "replica: loaded snapshot");
    }

    fn render_new(&mut self, record: ElementRecord) -> Reconciled {
        let id = record.id.clone();
        match self.store.insert(record) {
            Some(el) => {
                self.renderer.mount(el);
                Reconciled::Applied
            }
            None => {
                debug!(%id, "replica: spawn for rendered element ignored");
                Reconciled::AlreadyRendered
            }
        }
    }

    // --- Local intents ---

    /// Render a new element immediately and return the spawn to send.
    /// `None` if the id is already rendered.
    pub fn spawn(&mut self, intent: SpawnIntent) -> Option<ClientEvent> {
        if self.store.contains(&intent.id) {
            debug!(id = %intent.id, "replica: local spawn collides with rendered element");
            return None;
        }
        let record = intent.clone().into_record(self.identity.clone());
        self.render_new(record);
        Some(ClientEvent::Spawn(intent))
    }

    /// Move a rendered element and return the move to send.
    pub fn move_to(&mut self, id: &str, x: f64, y: f64) -> Option<ClientEvent> {
        let el = self.store.set_position(id, x, y)?;
        self.renderer.update(el);
        Some(ClientEvent::Move(MoveIntent { id: id.to_owned(), x, y }))
    }

    /// Resize a rendered element and return the resize to send.
    pub fn resize(&mut self, id: &str, width: f64, height: f64) -> Option<ClientEvent> {
        let el = self.store.set_size(id, width, height)?;
        self.renderer.update(el);
        Some(ClientEvent::Resize(ResizeIntent { id: id.to_owned(), width, height }))
    }

    /// Replace a rendered element's filters and return the filter to send.
    pub fn set_filters(&mut self, id: &str, filters: Filters) -> Option<ClientEvent> {
        let el = self.store.set_filters(id, filters.clone())?;
        self.renderer.update(el);
        Some(ClientEvent::Filter(FilterIntent {
            id: id.to_owned(),
            filters,
            sender_id: self.identity.clone().unwrap_or_default(),
        }))
    }

    /// Remove a rendered element and return the delete to send.
    pub fn delete(&mut self, id: &str) -> Option<ClientEvent> {
        self.store.remove(id)?;
        self.renderer.unmount(id);
        Some(ClientEvent::Delete(DeleteIntent { id: id.to_owned() }))
    }

    /// Raise an element locally. Stacking is never sent to the server.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        if self.store.bring_to_front(id).is_none() {
            return false;
        }
        if let Some(el) = self.store.get(id) {
            self.renderer.update(el);
        }
        true
    }
}

fn missing(kind: &str, id: &str) -> Reconciled {
    debug!(%id, kind, "replica: event for unrendered element dropped");
    Reconciled::Missing
}
