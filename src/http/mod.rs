//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP / TLS / unix connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /realtime → gateway::socket (WebSocket upgrade)
//!     → /status   → status.rs (JSON summary)
//!     → /metrics  → status.rs (Prometheus text)
//! ```

pub mod server;
pub mod status;

pub use server::{AppState, HttpServer};
pub use status::StatusReport;
