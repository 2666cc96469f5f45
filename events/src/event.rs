//! Intent and broadcast events.
//!
//! DESIGN
//! ======
//! Client → server traffic is the closed [`ClientEvent`] set, one variant per
//! intent kind. Server → client traffic is [`ServerEvent`]: the relayed
//! intents plus the session handshake, the snapshot, and presence updates.
//! Both serialize as adjacently tagged envelopes so the event name is always
//! readable without knowing the payload shape.

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::record::{ElementKind, ElementRecord, Filters};

// =============================================================================
// INTENT PAYLOADS
// =============================================================================

/// Request to create an element. Geometry and filters fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnIntent {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: ElementKind,
    #[serde(default, alias = "src", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

impl SpawnIntent {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            x: None,
            y: None,
            width: None,
            height: None,
            filters: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Build the full record this intent describes, filling defaults.
    #[must_use]
    pub fn into_record(self, owner_session: Option<String>) -> ElementRecord {
        let mut record = ElementRecord::new(self.id, self.kind);
        if let Some(source) = self.source {
            record = record.with_source(source);
        }
        if let Some(x) = self.x {
            record.x = x;
        }
        if let Some(y) = self.y {
            record.y = y;
        }
        if let Some(width) = self.width {
            record.width = width;
        }
        if let Some(height) = self.height {
            record.height = height;
        }
        if let Some(filters) = self.filters {
            record.filters = filters;
        }
        record.owner_session = owner_session;
        record
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeIntent {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// Total replacement of an element's filter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterIntent {
    pub id: String,
    pub filters: Filters,
    /// Identity of the originating session. Stamped by the server.
    #[serde(default)]
    pub sender_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteIntent {
    pub id: String,
}

// =============================================================================
// CLIENT EVENTS
// =============================================================================

/// Discriminant of a [`ClientEvent`], used for dispatch and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Spawn,
    Move,
    Resize,
    Filter,
    Delete,
}

impl IntentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Move => "move",
            Self::Resize => "resize",
            Self::Filter => "filter",
            Self::Delete => "delete",
        }
    }

    /// Gesture-driven intents emitted once per movement step.
    #[must_use]
    pub fn is_high_frequency(self) -> bool {
        matches!(self, Self::Move | Self::Resize)
    }
}

/// Every intent a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Spawn(SpawnIntent),
    Move(MoveIntent),
    Resize(ResizeIntent),
    Filter(FilterIntent),
    Delete(DeleteIntent),
}

impl ClientEvent {
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Spawn(_) => IntentKind::Spawn,
            Self::Move(_) => IntentKind::Move,
            Self::Resize(_) => IntentKind::Resize,
            Self::Filter(_) => IntentKind::Filter,
            Self::Delete(_) => IntentKind::Delete,
        }
    }

    /// The element this intent targets.
    #[must_use]
    pub fn element_id(&self) -> &str {
        match self {
            Self::Spawn(i) => &i.id,
            Self::Move(i) => &i.id,
            Self::Resize(i) => &i.id,
            Self::Filter(i) => &i.id,
            Self::Delete(i) => &i.id,
        }
    }

    /// Reject payloads that parse but cannot be applied: blank ids and
    /// non-finite numbers.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.element_id().trim().is_empty() {
            let kind = self.kind().as_str();
            return Err(CodecError::Invalid(format!("{kind}: id must not be empty")));
        }
        match self {
            Self::Spawn(i) => {
                let geometry = [("x", i.x), ("y", i.y), ("width", i.width), ("height", i.height)];
                for (field, value) in geometry {
                    if let Some(v) = value {
                        ensure_finite(field, v)?;
                    }
                }
                if let Some(filters) = &i.filters {
                    ensure_finite_filters(filters)?;
                }
            }
            Self::Move(i) => {
                ensure_finite("x", i.x)?;
                ensure_finite("y", i.y)?;
            }
            Self::Resize(i) => {
                ensure_finite("width", i.width)?;
                ensure_finite("height", i.height)?;
            }
            Self::Filter(i) => ensure_finite_filters(&i.filters)?,
            Self::Delete(_) => {}
        }
        Ok(())
    }
}

fn ensure_finite(field: &str, value: f64) -> Result<(), CodecError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CodecError::Invalid(format!("{field} must be a finite number")))
    }
}

fn ensure_finite_filters(filters: &Filters) -> Result<(), CodecError> {
    for (name, value) in filters {
        ensure_finite(&format!("filters.{name}"), *value)?;
    }
    Ok(())
}

// =============================================================================
// SERVER EVENTS
// =============================================================================

/// First event on every connection: tells the client who it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub client_id: String,
}

/// Every event the server may push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Hello(Hello),
    /// Full registry snapshot, sent once to a newly connected client.
    Init(Vec<ElementRecord>),
    /// Identities of every connected client.
    Users(Vec<String>),
    /// Identity of a client that disconnected.
    UserLeft(String),
    Spawn(ElementRecord),
    Move(MoveIntent),
    Resize(ResizeIntent),
    Filter(FilterIntent),
    Delete(DeleteIntent),
}

impl ServerEvent {
    /// Envelope name, as it appears in the `event` field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello(_) => "hello",
            Self::Init(_) => "init",
            Self::Users(_) => "users",
            Self::UserLeft(_) => "user-left",
            Self::Spawn(_) => "spawn",
            Self::Move(_) => "move",
            Self::Resize(_) => "resize",
            Self::Filter(_) => "filter",
            Self::Delete(_) => "delete",
        }
    }

    /// Whether a later event for the same element fully replaces this one.
    /// Only positional updates qualify; losing any other event leaves a
    /// replica out of step until it reloads `init`.
    #[must_use]
    pub fn is_superseded_by_later(&self) -> bool {
        matches!(self, Self::Move(_) | Self::Resize(_))
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
