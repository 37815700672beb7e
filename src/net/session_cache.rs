//! TLS session-resumption cache.
//!
//! Clients reconnecting after a dropped socket (very common for long-lived
//! realtime connections) present a session id from their previous handshake.
//! Keeping the session data lets rustls resume instead of running a full
//! handshake. The cache lives for the whole process.

use dashmap::DashMap;
use rustls::server::StoresServerSessions;

/// Default upper bound on stored sessions.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// In-memory store of TLS session data keyed by session id.
#[derive(Debug)]
pub struct ResumptionCache {
    entries: DashMap<Vec<u8>, Vec<u8>>,
    capacity: usize,
}

impl ResumptionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResumptionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StoresServerSessions for ResumptionCache {
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> bool {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            tracing::debug!(capacity = self.capacity, "Resumption cache full, not storing session");
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn take(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    fn can_cache(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_resumes() {
        let cache = ResumptionCache::default();
        assert!(cache.put(vec![0xde, 0xad], b"ticket".to_vec()));

        assert_eq!(cache.get(&[0xde, 0xad]), Some(b"ticket".to_vec()));
        assert_eq!(cache.get(&[0xbe, 0xef]), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn take_removes_entry() {
        let cache = ResumptionCache::default();
        cache.put(vec![1], b"a".to_vec());

        assert_eq!(cache.take(&[1]), Some(b"a".to_vec()));
        assert!(cache.is_empty());
    }

    #[test]
    fn refuses_new_entries_when_full() {
        let cache = ResumptionCache::new(1);
        assert!(cache.put(vec![1], b"a".to_vec()));
        assert!(!cache.put(vec![2], b"b".to_vec()));
        // Overwriting an existing id is still allowed.
        assert!(cache.put(vec![1], b"c".to_vec()));
        assert_eq!(cache.get(&[1]), Some(b"c".to_vec()));
    }

    #[test]
    fn keys_are_exact_bytes() {
        let cache = ResumptionCache::default();
        cache.put(vec![0x0f], b"short".to_vec());
        cache.put(vec![0x00, 0x0f], b"long".to_vec());

        assert_eq!(cache.get(&[0x0f]), Some(b"short".to_vec()));
        assert_eq!(cache.take(&[0x00, 0x0f]), Some(b"long".to_vec()));
        assert_eq!(cache.len(), 1);
    }
}
