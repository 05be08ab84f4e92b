//! Sent-message store and logout bookkeeping.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::types::SamlMessage;

/// Store of messages this service provider has sent, keyed by message ID.
///
/// The validator looks up `InResponseTo` ids here to bind a response to the
/// request that triggered it. Implementations must be safe for concurrent
/// access.
pub trait SentMessageStore: Send + Sync {
    /// Stores a sent message under its own ID.
    fn put(&self, message: SamlMessage);

    /// Looks up a previously sent message.
    fn get(&self, id: &str) -> Option<SamlMessage>;

    /// Removes a message once its correlation is no longer needed.
    fn remove(&self, id: &str);
}

/// In-memory sent-message store.
#[derive(Debug, Default)]
pub struct InMemorySentMessageStore {
    messages: Mutex<HashMap<String, SamlMessage>>,
}

impl InMemorySentMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SentMessageStore for InMemorySentMessageStore {
    fn put(&self, message: SamlMessage) {
        self.messages.lock().insert(message.id().to_string(), message);
    }

    fn get(&self, id: &str) -> Option<SamlMessage> {
        self.messages.lock().get(id).cloned()
    }

    fn remove(&self, id: &str) {
        self.messages.lock().remove(id);
    }
}

/// Best-effort session bookkeeping for Single Logout.
///
/// The validator hands every established session key to this hook,
/// fire-and-forget; logout processing itself happens elsewhere.
pub trait SessionLogoutHandler: Send + Sync {
    /// Records that a session identified by `key` was established.
    fn record_session(&self, key: &str);
}

/// Logout handler that keeps recorded keys in memory.
#[derive(Debug, Default)]
pub struct RecordingLogoutHandler {
    sessions: Mutex<Vec<String>>,
}

impl RecordingLogoutHandler {
    /// Creates an empty handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys recorded so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<String> {
        self.sessions.lock().clone()
    }
}

impl SessionLogoutHandler for RecordingLogoutHandler {
    fn record_session(&self, key: &str) {
        self.sessions.lock().push(key.to_string());
    }
}
