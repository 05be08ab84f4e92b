//! Replay cache provider trait.

use chrono::{DateTime, Utc};

/// Replay cache provider for at-most-once acceptance of identifiers.
///
/// Implementations must be thread-safe and support concurrent access from
/// independent validation requests. Identifiers are partitioned by a scope
/// string so that different consumers never collide on the same id space.
///
/// A backend that cannot reach its storage must return `false` (deny) rather
/// than accept an identifier it cannot record.
pub trait ReplayCacheProvider: Send + Sync {
    /// Checks and records an identifier within a scope.
    ///
    /// Returns `true` if `(scope, id)` has never been accepted before; the
    /// identifier is then recorded as used until `expires_at`. Returns
    /// `false` on a repeat within the validity window.
    fn check(&self, scope: &str, id: &str, expires_at: DateTime<Utc>) -> bool;
}
