//! Client-side replica of the shared stage.
//!
//! This crate keeps a participant's local view consistent with the server's
//! element registry. It applies broadcast events from the server, applies the
//! participant's own intents optimistically before they are sent, and hands
//! every resulting change to a host-supplied [`reconciler::Renderer`]. The
//! host owns gestures, media decoding, and drawing; the replica owns only the
//! canonical element state.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`reconciler`] | Remote/local event application and the render seam |
//! | [`store`] | Ordered local element store with client-local z-order |
//! | [`effect`] | Filter map → CSS `filter` effect string |
//! | [`ids`] | Client-generated element identifiers |

pub mod effect;
pub mod ids;
pub mod reconciler;
pub mod store;

pub use reconciler::{ConnectionStatus, Reconciled, Reconciler, Renderer};
pub use store::{LocalElement, ReplicaStore};
