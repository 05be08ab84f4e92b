//! In-process replay cache.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::provider::ReplayCacheProvider;

/// In-memory replay cache.
///
/// Entries expire lazily: expired entries are purged whenever the cache is
/// consulted, so the map stays bounded by the number of identifiers accepted
/// within one validity window.
#[derive(Debug, Default)]
pub struct InMemoryReplayCache {
    entries: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl InMemoryReplayCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live (non-expired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries.lock().values().filter(|e| **e > now).count()
    }

    /// Returns true if the cache holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayCacheProvider for InMemoryReplayCache {
    fn check(&self, scope: &str, id: &str, expires_at: DateTime<Utc>) -> bool {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, expiry| *expiry > now);

        let key = (scope.to_string(), id.to_string());
        if entries.contains_key(&key) {
            tracing::debug!(scope, id, "identifier already accepted, rejecting replay");
            return false;
        }
        entries.insert(key, expires_at);
        true
    }
}
