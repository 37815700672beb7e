//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Realtime upgrade request:
//!     → origin.rs (Origin header against allow list)
//!     → Realtime::secure hook
//!     → realtime::auth (session cookie)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - Checks run before any session-scoped state is created

pub mod origin;

pub use origin::{OriginPolicy, OriginRejected};
