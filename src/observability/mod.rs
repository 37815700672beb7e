//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout
//!     → /metrics (Prometheus scrape)
//!     → /status (JSON summary, see http::status)
//! ```

pub mod logging;
pub mod metrics;
