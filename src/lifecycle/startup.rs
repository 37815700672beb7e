//! Startup admission.
//!
//! # Responsibilities
//! - Run the persistence readiness gate once
//! - Bind the acceptor only after the gate passes
//! - Promote readiness once listening
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, there is no degraded mode
//! - A non-empty revision report right after a clean sync means a previous
//!   run crashed with unflushed edits; an operator must look before serving

use std::future::Future;

use crate::lifecycle::Lifecycle;
use crate::net::ListenerError;
use crate::persistence::{DocumentId, PersistenceError, ReadinessGate};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Can't sync database: {0}")]
    Sync(#[source] PersistenceError),
    #[error("server still not ready after db synced")]
    RealtimeNotReady,
    #[error("Can't check pending revisions: {0}")]
    Report(#[source] PersistenceError),
    #[error("{}", pending_summary(.0))]
    PendingRevisions(Vec<DocumentId>),
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

fn pending_summary(ids: &[DocumentId]) -> String {
    format!(
        "{} document(s) have unpersisted revisions: {}",
        ids.len(),
        ids.join(", ")
    )
}

/// Admit traffic: pass the gate, then bind exactly once.
///
/// `bind` is not called at all if the gate fails.
pub async fn admit<F, Fut, T>(
    gate: &ReadinessGate,
    lifecycle: &Lifecycle,
    bind: F,
) -> Result<T, StartupError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ListenerError>>,
{
    gate.check_startup().await?;
    tracing::info!("Persistence consistent, opening listener");

    let acceptor = bind().await?;
    lifecycle.mark_ready();
    Ok(acceptor)
}
