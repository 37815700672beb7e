//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → endpoint.rs (select unix path or host:port, bind)
//!     → tls.rs (optional TLS, backed by session_cache.rs)
//!     → Hand off to HTTP layer
//!
//! Accepted realtime sockets:
//!     → connection.rs (unique connection id)
//!     → gateway registry
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal; there is no retry loop
//! - TLS is optional and handled transparently
//! - TLS sessions are cached for resumption across reconnects

pub mod connection;
pub mod endpoint;
pub mod session_cache;
pub mod tls;

pub use connection::ConnectionId;
pub use endpoint::{select_endpoint, Acceptor, BindTarget, ListenerError};
pub use session_cache::ResumptionCache;
