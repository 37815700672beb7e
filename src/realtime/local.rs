//! Standalone realtime subsystem.
//!
//! Stands in for the document engine when the gateway runs on its own. It
//! reports ready while no session holds live document state, which is the
//! same condition the document engine uses, and counts hook invocations.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::gateway::protocol::{DisconnectReason, Event};
use crate::gateway::SessionHandle;
use crate::net::ConnectionId;
use crate::realtime::hooks::{Handshake, Identity, Realtime};

#[derive(Debug)]
pub struct LocalRealtime {
    available: AtomicBool,
    live_sessions: AtomicUsize,
    authorize_successes: AtomicUsize,
    authorize_failures: AtomicUsize,
    events: AtomicUsize,
    terminate_calls: AtomicUsize,
}

impl LocalRealtime {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            live_sessions: AtomicUsize::new(0),
            authorize_successes: AtomicUsize::new(0),
            authorize_failures: AtomicUsize::new(0),
            events: AtomicUsize::new(0),
            terminate_calls: AtomicUsize::new(0),
        }
    }

    /// Force readiness off (or back on) regardless of live sessions.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    pub fn authorize_successes(&self) -> usize {
        self.authorize_successes.load(Ordering::SeqCst)
    }

    pub fn authorize_failures(&self) -> usize {
        self.authorize_failures.load(Ordering::SeqCst)
    }

    pub fn events_received(&self) -> usize {
        self.events.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }
}

impl Default for LocalRealtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Realtime for LocalRealtime {
    fn is_ready(&self) -> bool {
        self.available.load(Ordering::SeqCst) && self.live_sessions() == 0
    }

    fn on_authorize_success(&self, _handshake: &Handshake, _identity: &Identity) {
        self.authorize_successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_authorize_fail(&self, _handshake: &Handshake, message: &str, force_disconnect: bool) {
        self.authorize_failures.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(reason = message, force_disconnect, "Authorization failed");
    }

    fn on_connection(&self, session: &SessionHandle) {
        self.live_sessions.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(connection_id = %session.id(), identity = ?session.identity(), "Session joined");
    }

    fn on_event(&self, id: ConnectionId, event: Event) {
        self.events.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %id, event = %event.event, "Event received");
    }

    fn on_disconnect(&self, id: ConnectionId, reason: DisconnectReason) {
        let _ = self
            .live_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        tracing::debug!(connection_id = %id, reason = reason.as_str(), "Session left");
    }

    fn terminate(&self) {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Realtime subsystem terminating");
    }
}
