//! In-memory persistence.
//!
//! Tracks a set of dirty document ids. Used by the standalone binary and by
//! tests that script flush timing and failures.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::persistence::{DocumentId, Persistence, PersistenceError};

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    pending: Mutex<BTreeSet<DocumentId>>,
    sync_failure: Mutex<Option<String>>,
    failing_reports: AtomicUsize,
    sync_calls: AtomicUsize,
    report_calls: AtomicUsize,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` has edits not yet written.
    pub fn mark_dirty(&self, id: impl Into<DocumentId>) {
        self.lock_pending().insert(id.into());
    }

    /// Record that `id` has been written.
    pub fn mark_flushed(&self, id: &str) {
        self.lock_pending().remove(id);
    }

    pub fn flush_all(&self) {
        self.lock_pending().clear();
    }

    /// Make every subsequent `sync` fail with `message`.
    pub fn fail_sync(&self, message: impl Into<String>) {
        *self
            .sync_failure
            .lock()
            .expect("persistence mutex poisoned") = Some(message.into());
    }

    /// Make the next `count` revision reports fail.
    pub fn fail_next_reports(&self, count: usize) {
        self.failing_reports.store(count, Ordering::SeqCst);
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, BTreeSet<DocumentId>> {
        self.pending.lock().expect("persistence mutex poisoned")
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn sync(&self) -> Result<(), PersistenceError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        match self
            .sync_failure
            .lock()
            .expect("persistence mutex poisoned")
            .as_ref()
        {
            Some(message) => Err(PersistenceError::Sync(message.clone())),
            None => Ok(()),
        }
    }

    async fn pending_revisions(&self) -> Result<Vec<DocumentId>, PersistenceError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_reports
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(PersistenceError::Report("revision query failed".into()));
        }
        Ok(self.lock_pending().iter().cloned().collect())
    }
}
