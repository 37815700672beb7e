//! Listening endpoint selection and binding.
//!
//! # Responsibilities
//! - Decide between a unix domain socket and host:port from config
//! - Bind the chosen target, optionally wrapped in TLS
//! - Surface bind failures as fatal startup errors (no retry)

use axum_server::tls_rustls::RustlsConfig;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::net::session_cache::ResumptionCache;
use crate::net::tls::{load_tls_config, TlsError};

/// Where the gateway listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// TCP host and port.
    Tcp { host: String, port: u16 },
}

impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindTarget::Unix(path) => write!(f, "{}", path.display()),
            BindTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

/// Pick the bind target: a configured socket path wins over host:port.
pub fn select_endpoint(config: &ListenerConfig) -> BindTarget {
    match &config.path {
        Some(path) => BindTarget::Unix(PathBuf::from(path)),
        None => BindTarget::Tcp {
            host: config.host.clone(),
            port: config.port,
        },
    }
}

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind {target}: {source}")]
    Bind {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unix sockets are not supported on this platform")]
    UnixUnsupported,
    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// A bound listening socket, ready to be served.
pub enum Acceptor {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(tokio::net::UnixListener),
    Tls {
        listener: std::net::TcpListener,
        config: RustlsConfig,
    },
}

impl Acceptor {
    /// Bind the plain (non-TLS) target.
    pub async fn bind(target: &BindTarget) -> Result<Self, ListenerError> {
        match target {
            BindTarget::Tcp { host, port } => {
                let listener = bind_tcp(target, host, *port).await?;
                Ok(Acceptor::Tcp(listener))
            }
            BindTarget::Unix(path) => bind_unix(target, path),
        }
    }

    /// Bind according to the listener config, enabling TLS when configured.
    pub async fn bind_config(
        config: &ListenerConfig,
        cache: Arc<ResumptionCache>,
    ) -> Result<Self, ListenerError> {
        let target = select_endpoint(config);
        let (Some(tls), BindTarget::Tcp { host, port }) = (&config.tls, &target) else {
            return Self::bind(&target).await;
        };

        let tls_config =
            load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path), cache).await?;
        let listener = bind_tcp(&target, host, *port).await?;
        let listener = listener.into_std().map_err(|source| ListenerError::Bind {
            target: target.to_string(),
            source,
        })?;

        Ok(Acceptor::Tls {
            listener,
            config: tls_config,
        })
    }

    /// Local TCP address, if this is a TCP acceptor.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Acceptor::Tcp(listener) => listener.local_addr().ok(),
            Acceptor::Tls { listener, .. } => listener.local_addr().ok(),
            #[cfg(unix)]
            Acceptor::Unix(_) => None,
        }
    }

    /// Human-readable address for logs.
    pub fn describe(&self) -> String {
        match self {
            Acceptor::Tcp(listener) => listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".into()),
            Acceptor::Tls { listener, .. } => listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".into()),
            #[cfg(unix)]
            Acceptor::Unix(listener) => listener
                .local_addr()
                .ok()
                .and_then(|a| a.as_pathname().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "unix socket".into()),
        }
    }

    /// URL scheme served by this acceptor.
    pub fn scheme(&self) -> &'static str {
        match self {
            Acceptor::Tls { .. } => "HTTPS",
            _ => "HTTP",
        }
    }
}

async fn bind_tcp(target: &BindTarget, host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| ListenerError::Bind {
            target: target.to_string(),
            source,
        })
}

#[cfg(unix)]
fn bind_unix(target: &BindTarget, path: &Path) -> Result<Acceptor, ListenerError> {
    let listener = tokio::net::UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        target: target.to_string(),
        source,
    })?;
    Ok(Acceptor::Unix(listener))
}

#[cfg(not(unix))]
fn bind_unix(_target: &BindTarget, _path: &Path) -> Result<Acceptor, ListenerError> {
    Err(ListenerError::UnixUnsupported)
}
