//! Realtime session authentication.
//!
//! A realtime handshake carries the same signed session cookie as ordinary
//! HTTP requests. It is unsigned with the shared secret and resolved against
//! the shared session store; the connection is admitted only if that yields
//! an identity. Exactly one of the realtime authorize hooks fires per call.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::observability::metrics;
use crate::realtime::cookie;
use crate::realtime::hooks::{Handshake, Identity, Realtime};
use crate::realtime::session_store::SessionStore;

/// Why a handshake was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No cookie transmitted.")]
    MissingCookie,
    #[error("Cookie is invalid.")]
    InvalidSignature,
    #[error("No session found")]
    SessionNotFound,
    #[error("User not authorized through passport. (User Property not found)")]
    NotLoggedIn,
    #[error("Error in session store: {0}")]
    Store(String),
}

impl AuthError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCookie => "token_missing",
            AuthError::InvalidSignature => "token_invalid",
            AuthError::SessionNotFound => "session_missing",
            AuthError::NotLoggedIn => "user_missing",
            AuthError::Store(_) => "store_error",
        }
    }
}

pub struct SessionAuthenticator {
    cookie_name: String,
    secret: String,
    allow_anonymous: bool,
    store: Arc<dyn SessionStore>,
    realtime: Arc<dyn Realtime>,
}

impl SessionAuthenticator {
    pub fn new(
        config: &SessionConfig,
        store: Arc<dyn SessionStore>,
        realtime: Arc<dyn Realtime>,
    ) -> Self {
        Self {
            cookie_name: config.name.clone(),
            secret: config.secret.clone(),
            allow_anonymous: config.allow_anonymous,
            store,
            realtime,
        }
    }

    /// Authenticate a handshake and fire the matching realtime hook.
    pub async fn authorize(&self, handshake: &Handshake) -> Result<Identity, AuthError> {
        match self.resolve(handshake).await {
            Ok(identity) => {
                tracing::debug!(identity = ?identity, "Realtime handshake authorized");
                self.realtime.on_authorize_success(handshake, &identity);
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(reason = e.reason(), error = %e, "Realtime handshake rejected");
                metrics::record_auth_failure(e.reason());
                self.realtime.on_authorize_fail(handshake, &e.to_string(), true);
                Err(e)
            }
        }
    }

    async fn resolve(&self, handshake: &Handshake) -> Result<Identity, AuthError> {
        let raw = handshake
            .cookie(&self.cookie_name)
            .ok_or(AuthError::MissingCookie)?;
        let sid = cookie::session_id(&raw, &self.secret).ok_or(AuthError::InvalidSignature)?;

        let record = self
            .store
            .load(&sid)
            .await
            .map_err(|e| AuthError::Store(e.0))?
            .ok_or(AuthError::SessionNotFound)?;

        match record.user {
            Some(user) => Ok(Identity::User(user)),
            None if self.allow_anonymous => Ok(Identity::Anonymous),
            None => Err(AuthError::NotLoggedIn),
        }
    }
}
