//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Sync storage → Readiness gate → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Maintenance on → Notify + drain sessions
//!     → Poll pending revisions vs. deadline → Exit 0 / 1
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGQUIT → channel → shutdown coordinator
//!
//! State (state.rs):
//!     Maintenance flag and readiness, shared by Arc
//! ```
//!
//! # Design Decisions
//! - Ordered startup: storage first, listener last
//! - Shutdown has a hard deadline: forced exit after it
//! - Maintenance is one-way; the process exits rather than resuming

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{CoordinatorState, ExitStatus, ShutdownCoordinator};
pub use signals::TerminationSignal;
pub use startup::StartupError;
pub use state::{Lifecycle, Readiness};
