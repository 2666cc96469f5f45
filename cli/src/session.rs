//! One websocket session against a stage server.

use std::time::Duration;

use events::codec::{decode_server_binary, decode_server_text};
use events::{ClientEvent, Codec, Payload, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use replica::{Reconciler, Renderer};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::CliError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct StageSession {
    stream: WsStream,
    codec: Codec,
}

impl StageSession {
    pub async fn connect(url: &str, codec: Codec) -> Result<Self, CliError> {
        let url = session_url(url, codec);
        debug!(%url, "session: connecting");
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|error| CliError::WsConnect(Box::new(error)))?;
        Ok(Self { stream, codec })
    }

    /// Feed server events into `replica` until the `init` snapshot has been
    /// applied. `hello` always precedes it, so the replica knows its
    /// identity afterwards.
    pub async fn bootstrap<R: Renderer>(
        &mut self,
        replica: &mut Reconciler<R>,
        timeout: Duration,
    ) -> Result<(), CliError> {
        loop {
            let event = self.recv(Some(timeout)).await?;
            let is_init = matches!(event, ServerEvent::Init(_));
            replica.apply_remote(event);
            if is_init {
                return Ok(());
            }
        }
    }

    /// Next server event. `None` waits indefinitely.
    pub async fn recv(&mut self, timeout: Option<Duration>) -> Result<ServerEvent, CliError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.next_event())
                .await
                .map_err(|_| CliError::Timeout)?,
            None => self.next_event().await,
        }
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), CliError> {
        let message = match self.codec.encode(event).map_err(CliError::Encode)? {
            Payload::Text(json) => Message::Text(json.into()),
            Payload::Binary(bytes) => Message::Binary(bytes.into()),
        };
        self.stream
            .send(message)
            .await
            .map_err(|error| CliError::WsSend(Box::new(error)))
    }

    /// Flush pending frames and close politely.
    pub async fn close(mut self) -> Result<(), CliError> {
        self.stream
            .close(None)
            .await
            .map_err(|error| CliError::WsSend(Box::new(error)))
    }

    async fn next_event(&mut self) -> Result<ServerEvent, CliError> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsRecv(Box::new(error)))? {
                Message::Text(text) => return Ok(decode_server_text(&text)?),
                Message::Binary(bytes) => return Ok(decode_server_binary(&bytes)?),
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    }
}

/// Append the codec query parameter when binary frames are requested.
pub fn session_url(base: &str, codec: Codec) -> String {
    match codec {
        Codec::Json => base.to_owned(),
        Codec::Binary if base.contains('?') => format!("{base}&codec=binary"),
        Codec::Binary => format!("{base}?codec=binary"),
    }
}
