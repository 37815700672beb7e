//! Persistence readiness gate.
//!
//! Startup runs a single check and treats anything short of "synced, ready,
//! nothing pending" as fatal. Shutdown polls until nothing is pending; poll
//! errors are logged and the loop keeps going, since only the coordinator's
//! deadline bounds the wait.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::startup::StartupError;
use crate::persistence::Persistence;
use crate::realtime::Realtime;

/// How a bounded consistency wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyOutcome {
    /// The pending-revision report came back empty.
    Consistent,
    /// The deadline elapsed first.
    TimedOut,
}

#[derive(Clone)]
pub struct ReadinessGate {
    persistence: Arc<dyn Persistence>,
    realtime: Arc<dyn Realtime>,
}

impl ReadinessGate {
    pub fn new(persistence: Arc<dyn Persistence>, realtime: Arc<dyn Realtime>) -> Self {
        Self {
            persistence,
            realtime,
        }
    }

    /// Startup admission: sync, require readiness, require an empty report.
    pub async fn check_startup(&self) -> Result<(), StartupError> {
        self.persistence.sync().await.map_err(StartupError::Sync)?;
        tracing::debug!("Storage sync complete");

        if !self.realtime.is_ready() {
            return Err(StartupError::RealtimeNotReady);
        }

        let pending = self
            .persistence
            .pending_revisions()
            .await
            .map_err(StartupError::Report)?;
        if !pending.is_empty() {
            return Err(StartupError::PendingRevisions(pending));
        }

        Ok(())
    }

    /// Poll until the pending-revision report is empty.
    ///
    /// The first check happens one interval after the call. Ticks where the
    /// realtime subsystem is not ready are skipped.
    pub async fn await_consistency(&self, poll_interval: Duration) {
        let mut ticker = time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if !self.realtime.is_ready() {
                tracing::trace!("Realtime not ready, skipping revision check");
                continue;
            }

            match self.persistence.pending_revisions().await {
                Ok(pending) if pending.is_empty() => return,
                Ok(pending) => {
                    tracing::debug!(pending = pending.len(), "Documents still pending");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Revision check failed while draining");
                }
            }
        }
    }

    /// `await_consistency` raced against `timeout`. The loser is dropped.
    pub async fn await_consistency_within(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> ConsistencyOutcome {
        tokio::select! {
            _ = self.await_consistency(poll_interval) => ConsistencyOutcome::Consistent,
            _ = time::sleep(timeout) => ConsistencyOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryPersistence, PersistenceError};
    use crate::realtime::LocalRealtime;

    fn gate(persistence: &Arc<MemoryPersistence>, realtime: &Arc<LocalRealtime>) -> ReadinessGate {
        ReadinessGate::new(persistence.clone(), realtime.clone())
    }

    #[tokio::test]
    async fn startup_passes_when_clean() {
        let persistence = Arc::new(MemoryPersistence::new());
        let realtime = Arc::new(LocalRealtime::new());
        assert!(gate(&persistence, &realtime).check_startup().await.is_ok());
        assert_eq!(persistence.sync_calls(), 1);
    }

    #[tokio::test]
    async fn startup_rejects_pending_documents() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.mark_dirty("note-a");
        let realtime = Arc::new(LocalRealtime::new());

        let err = gate(&persistence, &realtime).check_startup().await.unwrap_err();
        assert!(matches!(err, StartupError::PendingRevisions(ref ids) if ids == &["note-a"]));
    }

    #[tokio::test]
    async fn startup_rejects_unready_realtime() {
        let persistence = Arc::new(MemoryPersistence::new());
        let realtime = Arc::new(LocalRealtime::new());
        realtime.set_available(false);

        let err = gate(&persistence, &realtime).check_startup().await.unwrap_err();
        assert!(matches!(err, StartupError::RealtimeNotReady));
    }

    #[tokio::test]
    async fn startup_propagates_sync_failure() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.fail_sync("database locked");
        let realtime = Arc::new(LocalRealtime::new());

        let err = gate(&persistence, &realtime).check_startup().await.unwrap_err();
        assert!(matches!(err, StartupError::Sync(PersistenceError::Sync(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_times_out_when_never_consistent() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.mark_dirty("note-a");
        let realtime = Arc::new(LocalRealtime::new());

        let start = Instant::now();
        let outcome = gate(&persistence, &realtime)
            .await_consistency_within(Duration::from_millis(100), Duration::from_millis(1_000))
            .await;

        assert_eq!(outcome, ConsistencyOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_survives_report_errors() {
        let persistence = Arc::new(MemoryPersistence::new());
        persistence.fail_next_reports(3);
        let realtime = Arc::new(LocalRealtime::new());

        let start = Instant::now();
        let outcome = gate(&persistence, &realtime)
            .await_consistency_within(Duration::from_millis(100), Duration::from_millis(1_000))
            .await;

        assert_eq!(outcome, ConsistencyOutcome::Consistent);
        // three failed ticks, success on the fourth
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
