//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the collaboration gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind target, TLS, allowed origins).
    pub listener: ListenerConfig,

    /// Shared HTTP session settings (cookie name, secret).
    pub session: SessionConfig,

    /// Realtime connection liveness settings.
    pub heartbeat: HeartbeatConfig,

    /// Drain poll interval and hard deadline.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind when no unix socket path is given.
    pub host: String,

    /// Port to bind when no unix socket path is given.
    pub port: u16,

    /// Unix domain socket path. Takes precedence over host/port.
    pub path: Option<String>,

    /// Optional TLS configuration (TCP only).
    pub tls: Option<TlsConfig>,

    /// Hosts allowed in the `Origin` header of realtime handshakes.
    pub allow_origin: Vec<String>,

    /// Maximum in-flight requests, and maximum realtime sessions
    /// (backpressure). Excess is refused with 503.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            path: None,
            tls: None,
            allow_origin: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Session cookie settings shared with the HTTP session layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name carrying the signed session id.
    pub name: String,

    /// Secret used to sign the session cookie.
    pub secret: String,

    /// Admit sessions that exist but carry no logged-in user.
    pub allow_anonymous: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "connect.sid".to_string(),
            secret: "this is a session secret".to_string(),
            allow_anonymous: false,
        }
    }
}

/// Heartbeat configuration for realtime connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Interval between server pings in milliseconds.
    pub interval_ms: u64,

    /// Silence after which a connection is dropped, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            timeout_ms: 10_000,
        }
    }
}

impl HeartbeatConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Shutdown drain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Interval between pending-revision checks while draining.
    pub poll_interval_ms: u64,

    /// Hard deadline after which the process exits with failure.
    pub deadline_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            deadline_ms: 5_000,
        }
    }
}

impl ShutdownConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Serve Prometheus metrics on `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            port = 8080

            [shutdown]
            deadline_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.host, "127.0.0.1");
        assert_eq!(config.shutdown.deadline(), Duration::from_secs(2));
        assert_eq!(config.shutdown.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.session.name, "connect.sid");
    }
}
