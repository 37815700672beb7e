//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and cross-field
//! constraints. All errors are returned, not just the first.

use std::fmt;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.path.as_deref() {
        Some("") => errors.push(ValidationError::new("listener.path", "must not be empty")),
        Some(_) => {}
        None => {
            if config.listener.host.is_empty() {
                errors.push(ValidationError::new("listener.host", "must not be empty"));
            }
            if config.listener.port == 0 {
                errors.push(ValidationError::new("listener.port", "must be non-zero"));
            }
        }
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be greater than 0",
        ));
    }

    if config.listener.path.is_some() && config.listener.tls.is_some() {
        errors.push(ValidationError::new(
            "listener.tls",
            "TLS is only supported on TCP listeners",
        ));
    }

    if config.session.name.is_empty() {
        errors.push(ValidationError::new("session.name", "must not be empty"));
    }
    if config.session.secret.is_empty() {
        errors.push(ValidationError::new("session.secret", "must not be empty"));
    }

    let heartbeat = &config.heartbeat;
    if heartbeat.interval_ms == 0 {
        errors.push(ValidationError::new("heartbeat.interval_ms", "must be non-zero"));
    }
    if heartbeat.timeout_ms <= heartbeat.interval_ms {
        errors.push(ValidationError::new(
            "heartbeat.timeout_ms",
            format!("must exceed interval_ms ({})", heartbeat.interval_ms),
        ));
    }

    let shutdown = &config.shutdown;
    if shutdown.poll_interval_ms == 0 {
        errors.push(ValidationError::new("shutdown.poll_interval_ms", "must be non-zero"));
    }
    if shutdown.deadline_ms <= shutdown.poll_interval_ms {
        errors.push(ValidationError::new(
            "shutdown.deadline_ms",
            format!("must exceed poll_interval_ms ({})", shutdown.poll_interval_ms),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
