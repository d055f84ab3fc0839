//! Socket.IO packet codec for the agent event channel.
//!
//! Engine.IO text packets start with a type digit; message packets (`4`)
//! carry a Socket.IO packet whose own type digit follows:
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000}   open
//! 2 / 3                                ping / pong
//! 40                                   connected to namespace
//! 41                                   disconnected by server
//! 42["exec:output",{...}]              event
//! 42/ns,7["exec:exit",{...}]           event with namespace and ack id
//! 44"reason"                           error
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine handshake.
    Open(Handshake),
    /// Engine asks to close the transport.
    Close,
    /// Heartbeat probe; must be answered with a pong echoing the payload.
    Ping(String),
    Pong(String),
    /// Namespace connected.
    Connect,
    /// Namespace disconnected by the server.
    Disconnect,
    /// Named event with its first argument.
    Event { name: String, payload: Value },
    /// Server-side error.
    Error(String),
    /// Anything the client has no use for (acks, upgrade, noop, binary).
    Ignored,
}

/// Engine.IO open handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Handshake {
    pub sid: String,
    /// Milliseconds between heartbeats.
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty packet")]
    Empty,

    #[error("unknown packet type '{0}'")]
    UnknownType(char),

    #[error("malformed packet: {0}")]
    Malformed(String),
}

/// Client heartbeat probe.
pub const PING: &str = "2";

/// Answer to a server probe.
pub fn encode_pong(payload: &str) -> String {
    format!("3{}", payload)
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<Packet, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Packet::Open)
            .map_err(|e| FrameError::Malformed(format!("handshake: {}", e))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping(rest.to_string())),
        '3' => Ok(Packet::Pong(rest.to_string())),
        '4' => decode_message(rest),
        '5' | '6' => Ok(Packet::Ignored),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn decode_message(text: &str) -> Result<Packet, FrameError> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| FrameError::Malformed("message without type".to_string()))?;
    let body = strip_ack_id(strip_namespace(chars.as_str()));

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body),
        '3' | '5' | '6' => Ok(Packet::Ignored),
        '4' => Ok(Packet::Error(error_reason(body))),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn decode_event(body: &str) -> Result<Packet, FrameError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FrameError::Malformed(format!("event: {}", e)))?;
    let Value::Array(mut items) = value else {
        return Err(FrameError::Malformed("event is not an array".to_string()));
    };
    if items.is_empty() {
        return Err(FrameError::Malformed("event without name".to_string()));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(FrameError::Malformed("event name is not a string".to_string()));
    };
    let payload = if items.is_empty() {
        Value::Null
    } else {
        items.remove(0)
    };
    Ok(Packet::Event { name, payload })
}

/// `/ns,rest` → `rest`; the default namespace carries no prefix.
fn strip_namespace(text: &str) -> &str {
    if !text.starts_with('/') {
        return text;
    }
    match text.find(',') {
        Some(idx) => &text[idx + 1..],
        None => "",
    }
}

fn strip_ack_id(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn error_reason(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => body.to_string(),
        },
        _ => body.to_string(),
    }
}
