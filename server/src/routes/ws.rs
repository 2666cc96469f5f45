//! WebSocket handler: bidirectional event relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers the connection with the
//! stage, and enters a `select!` loop:
//! - Incoming client frames → decode + validate → route on the stage
//! - Events queued by the stage → encode → forward to client
//!
//! Decoding happens here, at the transport boundary. The stage only ever
//! sees well-formed [`ClientEvent`]s; anything else is logged and dropped
//! without a reply.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → stage queues `hello`, `init`, and a `users` broadcast
//! 2. Client sends intents → stage mutates the registry and relays to peers
//! 3. Close → stage broadcasts `user-left` → cleanup
//!
//! If the stage evicts a lagging client its queue closes; the loop ends and
//! the socket is dropped so the client reconnects and reloads `init`.

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use events::codec::{decode_client_binary, decode_client_text};
use events::{ClientEvent, Codec, CodecError, Payload, ServerEvent};

use crate::router::BroadcastDecision;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let codec = Codec::from_param(params.get("codec").map(String::as_str));
    ws.on_upgrade(move |socket| run_ws(socket, state, codec))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, codec: Codec) {
    let client_id = Uuid::new_v4();

    // Per-connection queue for events addressed to this client.
    let capacity = state.config.client_channel_capacity;
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(capacity);
    if !state.stage.lock().await.connect(client_id, client_tx) {
        warn!(%client_id, capacity, "ws: join refused");
        return;
    }

    info!(%client_id, ?codec, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound(&state, client_id, Inbound::Text(text.as_str())).await;
                    }
                    Message::Binary(bytes) => {
                        process_inbound(&state, client_id, Inbound::Binary(&bytes)).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = client_rx.recv() => {
                // Queue closed: the stage evicted this client.
                let Some(event) = event else { break };
                if send_event(&mut socket, codec, client_id, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    state.stage.lock().await.disconnect(client_id);
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// INBOUND
// =============================================================================

/// One raw inbound frame body.
enum Inbound<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

impl Inbound<'_> {
    fn decode(&self) -> Result<ClientEvent, CodecError> {
        match self {
            Self::Text(text) => decode_client_text(text),
            Self::Binary(bytes) => decode_client_binary(bytes),
        }
    }
}

/// Decode one inbound frame and apply it to the stage.
///
/// Returns `None` for frames that fail to decode or validate. Kept separate
/// from the socket loop so tests can drive dispatch without a transport.
async fn process_inbound(
    state: &AppState,
    client_id: Uuid,
    inbound: Inbound<'_>,
) -> Option<BroadcastDecision> {
    let event = match inbound.decode() {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound event dropped");
            return None;
        }
    };
    Some(state.stage.lock().await.handle_intent(client_id, event))
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_event(
    socket: &mut WebSocket,
    codec: Codec,
    client_id: Uuid,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let message = match codec.encode(event) {
        Ok(Payload::Text(json)) => Message::Text(json.into()),
        Ok(Payload::Binary(bytes)) => Message::Binary(bytes.into()),
        Err(e) => {
            error!(
                %client_id,
                event = event.name(),
                error = %e,
                "ws: failed to encode outbound event"
            );
            return Ok(());
        }
    };
    socket.send(message).await
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
