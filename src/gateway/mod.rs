//! Realtime connection gateway.
//!
//! # Data Flow
//! ```text
//! GET /realtime (upgrade)
//!     → maintenance or at capacity? reject 503
//!     → security::origin, Realtime::secure → reject 403
//!     → realtime::auth → reject 401
//!     → socket.rs: register, heartbeat, pump events both ways
//!     → unregister on exit
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget delivery: a dead peer never blocks others
//! - Each connection has one ordered outbound queue
//! - New connections are refused once maintenance begins

pub mod protocol;
pub mod registry;
pub mod socket;

use serde_json::Value;
use std::sync::Arc;

use crate::config::{GatewayConfig, HeartbeatConfig};
use crate::lifecycle::Lifecycle;
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::realtime::{Realtime, SessionAuthenticator, SessionStore};
use crate::security::OriginPolicy;

pub use protocol::{DisconnectReason, Event, MAINTENANCE_EVENT};
pub use registry::{Outbound, Registration, SessionHandle, SessionRegistry};

/// Owner of the session registry and the admission pipeline.
pub struct Gateway {
    registry: SessionRegistry,
    lifecycle: Arc<Lifecycle>,
    realtime: Arc<dyn Realtime>,
    authenticator: SessionAuthenticator,
    origins: OriginPolicy,
    heartbeat: HeartbeatConfig,
    max_connections: usize,
}

impl Gateway {
    pub fn new(
        config: &GatewayConfig,
        lifecycle: Arc<Lifecycle>,
        realtime: Arc<dyn Realtime>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            authenticator: SessionAuthenticator::new(&config.session, sessions, realtime.clone()),
            origins: OriginPolicy::new(config.listener.allow_origin.clone()),
            heartbeat: config.heartbeat.clone(),
            max_connections: config.listener.max_connections,
            lifecycle,
            realtime,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn realtime(&self) -> &Arc<dyn Realtime> {
        &self.realtime
    }

    pub fn authenticator(&self) -> &SessionAuthenticator {
        &self.authenticator
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    pub fn heartbeat(&self) -> &HeartbeatConfig {
        &self.heartbeat
    }

    /// Cap on in-flight requests and on registered sessions.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Whether the registry has reached `max_connections`.
    pub fn at_capacity(&self) -> bool {
        self.registry.len() >= self.max_connections
    }

    /// Send `event` to every registered session. Returns how many accepted it.
    pub fn broadcast(&self, event: &str, data: Value) -> usize {
        let delivered = self
            .registry
            .snapshot()
            .iter()
            .filter(|session| session.emit(event, data.clone()))
            .count();
        metrics::record_broadcast(event);
        delivered
    }

    /// Send `event` to one session. Unknown or dead sessions are ignored.
    pub fn emit(&self, id: ConnectionId, event: &str, data: Value) -> bool {
        self.registry
            .get(id)
            .is_some_and(|session| session.emit(event, data))
    }

    /// Unregister a session and queue its close frame.
    pub fn disconnect(&self, id: ConnectionId, reason: DisconnectReason) -> bool {
        match self.registry.remove(id) {
            Some(session) => {
                tracing::debug!(connection_id = %id, reason = reason.as_str(), "Disconnecting session");
                session.close(reason);
                true
            }
            None => false,
        }
    }

    /// Handles of every session registered right now.
    pub fn snapshot(&self) -> Vec<SessionHandle> {
        self.registry.snapshot()
    }

    pub fn online(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{Identity, LocalRealtime, MemorySessionStore};

    fn gateway() -> Gateway {
        Gateway::new(
            &GatewayConfig::default(),
            Arc::new(Lifecycle::new()),
            Arc::new(LocalRealtime::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[test]
    fn broadcast_skips_dead_sessions() {
        let gateway = gateway();
        let (alive, mut alive_rx) = SessionHandle::new(ConnectionId::new(), Identity::Anonymous);
        let (dead, dead_rx) = SessionHandle::new(ConnectionId::new(), Identity::Anonymous);
        drop(dead_rx);
        let _a = gateway.registry().register(alive);
        let _d = gateway.registry().register(dead);

        assert_eq!(gateway.broadcast("refresh", Value::Null), 1);
        assert_eq!(
            alive_rx.try_recv().unwrap(),
            Outbound::Event(Event::new("refresh", Value::Null))
        );
    }

    #[test]
    fn disconnect_removes_and_closes() {
        let gateway = gateway();
        let (session, mut rx) = SessionHandle::new(ConnectionId::new(), Identity::Anonymous);
        let id = session.id();
        let _guard = gateway.registry().register(session);

        assert!(gateway.disconnect(id, DisconnectReason::Requested));
        assert_eq!(gateway.online(), 0);
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close(DisconnectReason::Requested));

        assert!(!gateway.disconnect(id, DisconnectReason::Requested));
        assert!(!gateway.emit(id, "doc", Value::Null));
    }
}
