//! Element records: the unit of shared stage state.
//!
//! A record is flat on the wire: position and size travel as top-level
//! `x`/`y`/`width`/`height` fields next to the identity fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Width given to a spawned element that does not specify one.
pub const DEFAULT_WIDTH: f64 = 320.0;

/// Height given to a spawned element that does not specify one.
pub const DEFAULT_HEIGHT: f64 = 240.0;

/// Sparse filter name → intensity map. Absent keys mean "no effect".
///
/// Ordered so that derived effect strings and snapshots are deterministic.
pub type Filters = BTreeMap<String, f64>;

/// The kind of a stage element. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Live camera feed. The pixels come from the peer-video layer, never
    /// from shared state, so a webcam has no `source`.
    Webcam,
    /// Video referenced by URI or blob URL.
    Video,
    /// Image referenced by URI or blob URL.
    Image,
    /// Text box whose `source` is the text content.
    Text,
}

impl ElementKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webcam => "webcam",
            Self::Video => "video",
            Self::Image => "image",
            Self::Text => "text",
        }
    }

    /// Whether records of this kind carry a `source` payload.
    #[must_use]
    pub fn carries_source(self) -> bool {
        !matches!(self, Self::Webcam)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shared stage element as stored by the server and mirrored by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Client-generated identifier, unique within the registry.
    pub id: String,
    /// Element variant.
    pub kind: ElementKind,
    /// URI / blob reference for media, text content for text, absent for webcams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Left offset on the stage.
    pub x: f64,
    /// Top offset on the stage.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Current filter intensities.
    #[serde(default)]
    pub filters: Filters,
    /// Session that spawned the element. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_session: Option<String>,
}

impl ElementRecord {
    /// Create a record at the origin with the default size and no filters.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            x: 0.0,
            y: 0.0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            filters: Filters::new(),
            owner_session: None,
        }
    }

    /// Attach a source. Ignored for kinds that carry none.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        if self.kind.carries_source() {
            self.source = Some(source.into());
        }
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner_session = Some(owner.into());
        self
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
