//! Realtime session gateway and lifecycle coordinator for a collaborative
//! document service.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                    COLLAB GATEWAY                     │
//!                  │                                                       │
//!   Client (WS)    │  ┌─────────┐    ┌─────────┐    ┌──────────────────┐  │
//!   ───────────────┼─▶│   net   │───▶│  http   │───▶│     gateway      │  │
//!                  │  │endpoint │    │ server  │    │ admission + pump │  │
//!                  │  └─────────┘    └─────────┘    └────────┬─────────┘  │
//!                  │                                         │            │
//!                  │          ┌──────────────┐    ┌──────────▼─────────┐  │
//!                  │          │   security   │    │      realtime      │  │
//!                  │          │    origin    │    │ auth, cookie, hooks│  │
//!                  │          └──────────────┘    └──────────┬─────────┘  │
//!                  │                                         │            │
//!                  │  ┌───────────────────────┐   ┌──────────▼─────────┐  │
//!                  │  │       lifecycle       │──▶│    persistence     │  │
//!                  │  │ startup / shutdown    │   │  readiness gate    │  │
//!                  │  └───────────────────────┘   └────────────────────┘  │
//!                  │                                                       │
//!                  │      config · observability (cross-cutting)           │
//!                  └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod persistence;
pub mod realtime;
pub mod security;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::{ExitStatus, Lifecycle, ShutdownCoordinator};
