//! Realtime subsystem boundary.
//!
//! # Data Flow
//! ```text
//! WebSocket upgrade request
//!     → hooks.rs (Handshake, Realtime::secure)
//!     → auth.rs (cookie.rs unsign → session_store.rs lookup)
//!     → Identity attached, or connection refused
//! ```
//!
//! # Design Decisions
//! - Same cookie name, secret and store as the HTTP session layer
//! - Authorization failures are scoped to one connection
//! - No partial admission: a refused handshake never reaches the registry

pub mod auth;
pub mod cookie;
pub mod hooks;
pub mod local;
pub mod session_store;

pub use auth::{AuthError, SessionAuthenticator};
pub use hooks::{Handshake, Identity, Realtime};
pub use local::LocalRealtime;
pub use session_store::{MemorySessionStore, SessionRecord, SessionStore};
