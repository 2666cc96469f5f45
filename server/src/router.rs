//! Event router: applies client intents to the registry.
//!
//! DESIGN
//! ======
//! [`route`] is the dispatch table: one arm per intent kind, each calling a
//! handler with the same shape `(registry, origin, payload) -> BroadcastDecision`.
//! Handlers mutate the registry and say what, if anything, peers should see.
//! They never touch the session directory; [`crate::state::Stage`] owns
//! fan-out and always excludes the origin.
//!
//! Accepted intents are relayed verbatim except for two server-stamped
//! fields: `ownerSession` on spawn and `senderId` on filter both carry the
//! origin's identity, whatever the client sent.

use tracing::{debug, trace};
use uuid::Uuid;

use events::{
    ClientEvent, DeleteIntent, FilterIntent, IntentKind, MoveIntent, ResizeIntent, ServerEvent,
    SpawnIntent,
};

use crate::registry::{Insert, Registry};

// =============================================================================
// DECISION
// =============================================================================

/// What the dispatch layer should do after a handler ran.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastDecision {
    /// Registry changed; send this event to every other client.
    Relay(ServerEvent),
    /// Registry unchanged; nobody hears about it.
    Drop(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Spawn for an id that already exists.
    Duplicate,
    /// Mutation or delete for an id that does not exist.
    Dangling,
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Apply one validated intent from `origin`.
pub fn route(registry: &mut Registry, origin: Uuid, event: ClientEvent) -> BroadcastDecision {
    let kind = event.kind();
    let decision = match event {
        ClientEvent::Spawn(intent) => handle_spawn(registry, origin, intent),
        ClientEvent::Move(intent) => handle_move(registry, origin, intent),
        ClientEvent::Resize(intent) => handle_resize(registry, origin, intent),
        ClientEvent::Filter(intent) => handle_filter(registry, origin, intent),
        ClientEvent::Delete(intent) => handle_delete(registry, origin, intent),
    };
    if let BroadcastDecision::Drop(reason) = &decision {
        debug!(%origin, intent = kind.as_str(), ?reason, "router: intent dropped");
    } else if !kind.is_high_frequency() {
        debug!(
            %origin,
            intent = kind.as_str(),
            elements = registry.len(),
            "router: intent applied"
        );
    }
    decision
}

// =============================================================================
// HANDLERS
// =============================================================================

fn handle_spawn(registry: &mut Registry, origin: Uuid, intent: SpawnIntent) -> BroadcastDecision {
    let record = intent.into_record(Some(origin.to_string()));
    match registry.insert(record.clone()) {
        Insert::Inserted => BroadcastDecision::Relay(ServerEvent::Spawn(record)),
        Insert::Duplicate => BroadcastDecision::Drop(DropReason::Duplicate),
    }
}

fn handle_move(registry: &mut Registry, origin: Uuid, intent: MoveIntent) -> BroadcastDecision {
    trace!(%origin, id = %intent.id, x = intent.x, y = intent.y, "router: move");
    if registry.apply_move(&intent.id, intent.x, intent.y) {
        BroadcastDecision::Relay(ServerEvent::Move(intent))
    } else {
        dangling(IntentKind::Move)
    }
}

fn handle_resize(registry: &mut Registry, origin: Uuid, intent: ResizeIntent) -> BroadcastDecision {
    trace!(
        %origin,
        id = %intent.id,
        width = intent.width,
        height = intent.height,
        "router: resize"
    );
    if registry.apply_resize(&intent.id, intent.width, intent.height) {
        BroadcastDecision::Relay(ServerEvent::Resize(intent))
    } else {
        dangling(IntentKind::Resize)
    }
}

fn handle_filter(
    registry: &mut Registry,
    origin: Uuid,
    mut intent: FilterIntent,
) -> BroadcastDecision {
    intent.sender_id = origin.to_string();
    if registry.apply_filters(&intent.id, intent.filters.clone()) {
        BroadcastDecision::Relay(ServerEvent::Filter(intent))
    } else {
        dangling(IntentKind::Filter)
    }
}

fn handle_delete(
    registry: &mut Registry,
    _origin: Uuid,
    intent: DeleteIntent,
) -> BroadcastDecision {
    match registry.remove(&intent.id) {
        Some(_) => BroadcastDecision::Relay(ServerEvent::Delete(intent)),
        None => dangling(IntentKind::Delete),
    }
}

fn dangling(kind: IntentKind) -> BroadcastDecision {
    trace!(intent = kind.as_str(), "router: unknown element");
    BroadcastDecision::Drop(DropReason::Dangling)
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
