//! Origin validation for realtime handshakes.
//!
//! Browsers always send `Origin` on WebSocket upgrades, so a mismatch means
//! a page on another site is trying to ride the user's session cookie.
//! Requests without the header come from non-browser clients and pass.

use crate::realtime::Handshake;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("origin {0} is not allowed")]
pub struct OriginRejected(pub String);

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Hosts in `allowed` are matched case-insensitively; `*` allows any.
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    pub fn check(&self, handshake: &Handshake) -> Result<(), OriginRejected> {
        let Some(origin) = handshake.origin() else {
            return Ok(());
        };
        if self.allowed.iter().any(|h| h == "*") {
            return Ok(());
        }

        let host = origin_host(origin).to_ascii_lowercase();
        if self.allowed.iter().any(|h| *h == host) {
            Ok(())
        } else {
            Err(OriginRejected(origin.to_string()))
        }
    }
}

/// Host part of an origin such as `https://example.com:8443`.
fn origin_host(origin: &str) -> &str {
    let rest = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    let authority = rest.split('/').next().unwrap_or(rest);
    if let Some(bracketed) = authority.strip_prefix('[') {
        // IPv6 literal
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    authority.rsplit_once(':').map_or(authority, |(host, _)| host)
}
