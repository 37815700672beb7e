//! Operational endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::http::server::AppState;
use crate::lifecycle::Readiness;

/// Summary served on `/status`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub version: &'static str,
    pub online_sessions: usize,
    pub online_users: usize,
    pub maintenance: bool,
    pub readiness: Readiness,
}

impl StatusReport {
    pub fn collect(gateway: &Gateway) -> Self {
        let sessions = gateway.snapshot();
        let users: BTreeSet<&str> = sessions
            .iter()
            .filter_map(|s| s.identity().user_id())
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            online_sessions: sessions.len(),
            online_users: users.len(),
            maintenance: gateway.lifecycle().in_maintenance(),
            readiness: gateway.lifecycle().readiness(),
        }
    }
}

pub async fn get_status(State(gateway): State<Arc<Gateway>>) -> Response {
    (
        [(header::CACHE_CONTROL, "private")],
        Json(StatusReport::collect(&gateway)),
    )
        .into_response()
}

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::SessionHandle;
    use crate::lifecycle::Lifecycle;
    use crate::net::ConnectionId;
    use crate::realtime::{Identity, LocalRealtime, MemorySessionStore};

    #[test]
    fn counts_distinct_users() {
        let lifecycle = Arc::new(Lifecycle::new());
        let gateway = Gateway::new(
            &GatewayConfig::default(),
            lifecycle.clone(),
            Arc::new(LocalRealtime::new()),
            Arc::new(MemorySessionStore::new()),
        );

        let mut guards = Vec::new();
        for identity in [
            Identity::User("ada".into()),
            Identity::User("ada".into()),
            Identity::User("lin".into()),
            Identity::Anonymous,
        ] {
            let (handle, _rx) = SessionHandle::new(ConnectionId::new(), identity);
            guards.push(gateway.registry().register(handle));
        }
        lifecycle.mark_ready();

        let report = StatusReport::collect(&gateway);
        assert_eq!(report.online_sessions, 4);
        assert_eq!(report.online_users, 2);
        assert!(!report.maintenance);
        assert_eq!(report.readiness, Readiness::Ready);
    }
}
