//! Shared event model and codecs for the stage websocket protocol.
//!
//! This crate owns the wire representation used by the `server`, the
//! `replica` reconciler, and the `cli`. Every message is an envelope
//! `{"event": <name>, "data": <payload>}`. Text frames carry the envelope as
//! JSON; binary frames carry the same envelope as protobuf, with the payload
//! stored as a `google.protobuf.Value`.
//!
//! | Module | Role |
//! |--------|------|
//! | [`record`] | Element records, kinds, and filter maps |
//! | [`event`] | Closed sets of client intents and server events |
//! | [`codec`] | JSON / protobuf encoding and boundary validation |

pub mod codec;
pub mod event;
pub mod record;

pub use codec::{Codec, CodecError, Payload};
pub use event::{
    ClientEvent, DeleteIntent, FilterIntent, Hello, IntentKind, MoveIntent, ResizeIntent,
    ServerEvent, SpawnIntent,
};
pub use record::{DEFAULT_HEIGHT, DEFAULT_WIDTH, ElementKind, ElementRecord, Filters};
