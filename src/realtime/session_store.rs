//! Shared HTTP session store.
//!
//! The HTTP layer writes session records; the realtime authenticator only
//! reads them. Both must resolve the same sid to the same record.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session record as stored by the HTTP session layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Logged-in user, if any.
    #[serde(default)]
    pub user: Option<String>,
    /// Expiry in milliseconds since the epoch. `None` never expires.
    #[serde(default)]
    pub expires_at_ms: Option<u64>,
}

impl SessionRecord {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            expires_at_ms: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_expired(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.expires_at_ms.is_some_and(|expiry| expiry <= now)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("session store unavailable: {0}")]
pub struct SessionStoreError(pub String);

/// Read access to the shared session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the live (unexpired) session for `sid`.
    async fn load(&self, sid: &str) -> Result<Option<SessionRecord>, SessionStoreError>;
}

/// A session store backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<DashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, sid: impl Into<String>, record: SessionRecord) {
        self.inner.insert(sid.into(), record);
    }

    pub fn remove(&self, sid: &str) -> Option<SessionRecord> {
        self.inner.remove(sid).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, sid: &str) -> Result<Option<SessionRecord>, SessionStoreError> {
        Ok(self
            .inner
            .get(sid)
            .map(|entry| entry.value().clone())
            .filter(|record| !record.is_expired()))
    }
}
