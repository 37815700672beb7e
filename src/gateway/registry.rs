//! Session registry.
//!
//! Maps connection ids to session handles. A handle owns the sending half of
//! the connection's outbound queue; the socket task drains the other half.
//! Because events and close requests share one ordered queue, anything
//! emitted before a close is written before the close frame.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::gateway::protocol::{DisconnectReason, Event};
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::realtime::Identity;

/// Work queued for a connection's socket task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Event(Event),
    Close(DisconnectReason),
}

/// Handle to one registered realtime session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: ConnectionId,
    identity: Identity,
    sender: mpsc::UnboundedSender<Outbound>,
    connected_at: Instant,
}

impl SessionHandle {
    /// Create a handle and the receiver its socket task will drain.
    pub fn new(id: ConnectionId, identity: Identity) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id,
            identity,
            sender,
            connected_at: Instant::now(),
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Queue an event. Returns false if the connection is already gone.
    pub fn emit(&self, event: &str, data: Value) -> bool {
        self.sender
            .send(Outbound::Event(Event::new(event, data)))
            .is_ok()
    }

    /// Queue a close behind any pending events.
    pub fn close(&self, reason: DisconnectReason) -> bool {
        self.sender.send(Outbound::Close(reason)).is_ok()
    }
}

/// Concurrent map of live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session. The entry is removed when the guard drops.
    pub fn register(&self, handle: SessionHandle) -> Registration {
        let id = handle.id();
        self.inner.insert(id, handle);
        metrics::set_online_sessions(self.inner.len());
        Registration {
            registry: self.clone(),
            id,
        }
    }

    pub fn remove(&self, id: ConnectionId) -> Option<SessionHandle> {
        let removed = self.inner.remove(&id).map(|(_, handle)| handle);
        if removed.is_some() {
            metrics::set_online_sessions(self.inner.len());
        }
        removed
    }

    pub fn get(&self, id: ConnectionId) -> Option<SessionHandle> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }

    /// Handles of every session registered right now.
    pub fn snapshot(&self) -> Vec<SessionHandle> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Keeps a session registered for as long as it is held.
#[derive(Debug)]
pub struct Registration {
    registry: SessionRegistry,
    id: ConnectionId,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(self.id);
        tracing::trace!(connection_id = %self.id, "Session unregistered");
    }
}
