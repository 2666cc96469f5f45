//! JSON and protobuf codecs for event envelopes.
//!
//! Both codecs share one envelope model. JSON is the serde representation of
//! the event enums directly. Protobuf wraps the same envelope as
//! `WireEvent { name, data }` where `data` is a `google.protobuf.Value`, so the
//! binary path reuses the serde derives instead of mirroring every payload in
//! protobuf messages.

use prost::Message;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::event::{ClientEvent, ServerEvent};

/// Error returned by the decoders (and, rarely, the encoders).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON text was malformed or did not match any event shape.
    #[error("malformed json event: {0}")]
    Json(#[from] serde_json::Error),
    /// The raw bytes could not be decoded as a protobuf `WireEvent`.
    #[error("failed to decode protobuf event: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The serialized value was not an `{event, data}` envelope.
    #[error("event envelope missing `{0}`")]
    Envelope(&'static str),
    /// The event parsed but failed boundary validation.
    #[error("invalid event: {0}")]
    Invalid(String),
}

/// Wire format negotiated per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// JSON envelopes in websocket text frames.
    #[default]
    Json,
    /// Protobuf envelopes in websocket binary frames.
    Binary,
}

/// An encoded event ready to be placed in a websocket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Codec {
    /// Parse the `codec` query value. Unknown values fall back to JSON.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("binary" | "proto" | "protobuf") => Self::Binary,
            _ => Self::Json,
        }
    }

    /// Encode an event in this codec.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if the event cannot be serialized.
    pub fn encode<T: Serialize>(self, event: &T) -> Result<Payload, CodecError> {
        match self {
            Self::Json => Ok(Payload::Text(serde_json::to_string(event)?)),
            Self::Binary => Ok(Payload::Binary(encode_binary(event)?)),
        }
    }
}

// =============================================================================
// CLIENT / SERVER ENTRY POINTS
// =============================================================================

/// Decode and validate a client intent from JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed or unknown events and
/// [`CodecError::Invalid`] for payloads that fail validation.
pub fn decode_client_text(text: &str) -> Result<ClientEvent, CodecError> {
    let event: ClientEvent = serde_json::from_str(text)?;
    event.validate()?;
    Ok(event)
}

/// Decode and validate a client intent from protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes, plus the errors of
/// [`decode_client_text`].
pub fn decode_client_binary(bytes: &[u8]) -> Result<ClientEvent, CodecError> {
    let event: ClientEvent = decode_binary(bytes)?;
    event.validate()?;
    Ok(event)
}

/// Decode a server event from JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed or unknown events.
pub fn decode_server_text(text: &str) -> Result<ServerEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a server event from protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::Json`] if the envelope does not match a server event.
pub fn decode_server_binary(bytes: &[u8]) -> Result<ServerEvent, CodecError> {
    decode_binary(bytes)
}

// =============================================================================
// PROTOBUF ENVELOPE
// =============================================================================

/// Encode any envelope-shaped event into protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Envelope`] if the event does not serialize to an
/// `{event, data}` object.
pub fn encode_binary<T: Serialize>(event: &T) -> Result<Vec<u8>, CodecError> {
    let Value::Object(mut envelope) = serde_json::to_value(event)? else {
        return Err(CodecError::Envelope("event"));
    };
    let Some(Value::String(name)) = envelope.remove("event") else {
        return Err(CodecError::Envelope("event"));
    };
    let wire = WireEvent { name, data: envelope.get("data").map(json_to_proto_value) };

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of buffer.
    wire.encode(&mut out).unwrap_or_default();
    Ok(out)
}

fn decode_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let wire = WireEvent::decode(bytes)?;
    if wire.name.is_empty() {
        return Err(CodecError::Envelope("event"));
    }

    let mut envelope = Map::new();
    envelope.insert("event".into(), Value::String(wire.name));
    if let Some(data) = &wire.data {
        envelope.insert("data".into(), proto_to_json_value(data));
    }
    Ok(serde_json::from_value(Value::Object(envelope))?)
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => {
            serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
        }
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json_value).collect())
        }
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireEvent {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(message, optional, tag = "2")]
    data: Option<prost_types::Value>,
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
