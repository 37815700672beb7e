//! Persistence collaborator and readiness gate.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     sync() → realtime ready? → pending_revisions() empty? → admit
//!
//! Shutdown:
//!     every poll interval: realtime ready? → pending_revisions() empty?
//!     raced against the hard deadline
//! ```
//!
//! The storage engine itself lives elsewhere; this crate only needs to
//! know whether it has caught up.

pub mod gate;
pub mod memory;

use async_trait::async_trait;

pub use gate::{ConsistencyOutcome, ReadinessGate};
pub use memory::MemoryPersistence;

/// Identifier of a collaboratively edited document.
pub type DocumentId = String;

/// Error type for persistence queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage sync failed: {0}")]
    Sync(String),
    #[error("pending revision report failed: {0}")]
    Report(String),
}

/// The storage layer as seen by the lifecycle.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Bring the storage schema in sync. Called once at boot.
    async fn sync(&self) -> Result<(), PersistenceError>;

    /// Documents whose edits have not been durably written yet.
    async fn pending_revisions(&self) -> Result<Vec<DocumentId>, PersistenceError>;
}
