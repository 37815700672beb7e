//! The realtime subsystem as seen by the gateway.
//!
//! The document synchronization engine implements [`Realtime`]; the gateway
//! calls into it at each step of a connection's life.

use axum::http::{header, HeaderMap};
use serde::Serialize;

use crate::gateway::protocol::{DisconnectReason, Event};
use crate::gateway::SessionHandle;
use crate::net::ConnectionId;
use crate::realtime::cookie;

/// Resolved identity of an authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity {
    User(String),
    Anonymous,
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Anonymous => None,
        }
    }
}

/// The inbound upgrade request, before any session exists.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    headers: HeaderMap,
}

impl Handshake {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn origin(&self) -> Option<&str> {
        self.headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
    }

    /// Raw value of the cookie named `name`, across all `Cookie` headers.
    ///
    /// Headers are read lossily so a non-ASCII value in one pair does not
    /// hide the others.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .find_map(|v| cookie::find(&String::from_utf8_lossy(v.as_bytes()), name))
    }
}

/// Hooks implemented by the realtime (document sync) subsystem.
pub trait Realtime: Send + Sync {
    /// Whether the subsystem can safely interact with persistence.
    fn is_ready(&self) -> bool;

    /// Connection-level security check, run before authentication.
    fn secure(&self, _handshake: &Handshake) -> Result<(), String> {
        Ok(())
    }

    fn on_authorize_success(&self, handshake: &Handshake, identity: &Identity);

    fn on_authorize_fail(&self, handshake: &Handshake, message: &str, force_disconnect: bool);

    /// A session has been registered and may now receive events.
    fn on_connection(&self, session: &SessionHandle);

    fn on_event(&self, id: ConnectionId, event: Event);

    fn on_disconnect(&self, id: ConnectionId, reason: DisconnectReason);

    /// Stop background work ahead of shutdown.
    fn terminate(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_lookup_spans_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; connect.sid=xyz"));

        let handshake = Handshake::new(headers);
        assert_eq!(handshake.cookie("connect.sid").as_deref(), Some("xyz"));
        assert_eq!(handshake.cookie("missing"), None);
    }

    #[test]
    fn non_ascii_pair_does_not_hide_session_cookie() {
        let signed = cookie::encode_session_id("sid-1", "secret");
        let raw = format!("theme=café; connect.sid={signed}");
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_bytes(raw.as_bytes()).unwrap());

        let handshake = Handshake::new(headers);
        assert_eq!(handshake.cookie("connect.sid"), Some(signed));
        assert_eq!(handshake.cookie("theme").as_deref(), Some("café"));
    }

    #[test]
    fn identity_serializes_tagged() {
        let json = serde_json::to_value(Identity::User("u1".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "user", "id": "u1" }));
    }
}
