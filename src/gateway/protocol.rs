//! Realtime wire format.
//!
//! Every text frame is a JSON object `{"event": <name>, "data": <payload>}`.

use axum::extract::ws::close_code;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notice sent to every session before a drain disconnects it.
pub const MAINTENANCE_EVENT: &str = "maintenance";

/// A named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Event {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Drained during shutdown.
    Maintenance,
    /// No traffic within the heartbeat timeout.
    HeartbeatTimeout,
    /// Closed on request of server code.
    Requested,
    /// The peer sent a close frame or hung up.
    ClientClosed,
    /// Reading or writing the socket failed.
    TransportError,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Maintenance => "maintenance",
            DisconnectReason::HeartbeatTimeout => "heartbeat timeout",
            DisconnectReason::Requested => "server disconnect",
            DisconnectReason::ClientClosed => "client closed",
            DisconnectReason::TransportError => "transport error",
        }
    }

    /// WebSocket close code sent for server-initiated closes.
    pub fn close_code(&self) -> u16 {
        match self {
            DisconnectReason::Maintenance => close_code::RESTART,
            DisconnectReason::HeartbeatTimeout => close_code::AWAY,
            DisconnectReason::TransportError => close_code::ERROR,
            DisconnectReason::Requested | DisconnectReason::ClientClosed => close_code::NORMAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_data_defaults_to_null() {
        let event = Event::decode(r#"{"event":"cursor"}"#).unwrap();
        assert_eq!(event, Event::new("cursor", Value::Null));
    }

    #[test]
    fn encodes_event_and_data() {
        let text = Event::new("doc", json!({ "rev": 3 })).encode().unwrap();
        assert_eq!(text, r#"{"event":"doc","data":{"rev":3}}"#);
    }

    #[test]
    fn maintenance_close_signals_restart() {
        assert_eq!(DisconnectReason::Maintenance.close_code(), 1012);
    }
}
