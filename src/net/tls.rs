//! TLS configuration and certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use std::path::Path;
use std::sync::Arc;

use crate::net::session_cache::ResumptionCache;

const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Error type for TLS setup.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse certificates in {0}")]
    Certificates(String),
    #[error("no private key found in {0}")]
    MissingKey(String),
    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Load TLS configuration from certificate and key files.
///
/// Sessions are stored in `cache` so reconnecting clients can resume.
pub async fn load_tls_config(
    cert_path: &Path,
    key_path: &Path,
    cache: Arc<ResumptionCache>,
) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;

    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TlsError::Certificates(cert_path.display().to_string()))?;
    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|_| TlsError::MissingKey(key_path.display().to_string()))?
        .ok_or_else(|| TlsError::MissingKey(key_path.display().to_string()))?;

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.session_storage = cache;
    config.alpn_protocols = alpn_protocols();

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

/// WebSocket upgrades need HTTP/1.1; extended CONNECT over h2 is not enabled.
fn alpn_protocols() -> Vec<Vec<u8>> {
    vec![ALPN_HTTP11.to_vec()]
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        path: path.display().to_string(),
        source,
    })
}
