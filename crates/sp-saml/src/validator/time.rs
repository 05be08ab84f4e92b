//! Temporal comparisons with clock-skew tolerance.
//!
//! All instants are UTC. Skews and lifetimes are whole seconds.

use chrono::{DateTime, Duration, Utc};

/// Returns true when `instant` lies within `max_age_seconds` of `now`,
/// allowing `skew_seconds` of clock drift on both ends.
///
/// A non-positive `max_age_seconds` disables the window entirely.
#[must_use]
pub fn is_within(
    instant: DateTime<Utc>,
    max_age_seconds: i64,
    skew_seconds: i64,
    now: DateTime<Utc>,
) -> bool {
    if max_age_seconds <= 0 {
        tracing::debug!(
            max_age_seconds,
            %instant,
            "maximum lifetime is not positive, window validation disabled"
        );
        return true;
    }
    let lower = now - Duration::seconds(skew_seconds + max_age_seconds);
    let upper = now + Duration::seconds(skew_seconds);
    instant > lower && instant < upper
}

/// Returns true when a `notBefore` condition with value `t` is satisfied:
/// `t − skew ≤ now`.
#[must_use]
pub fn not_before_ok(t: DateTime<Utc>, now: DateTime<Utc>, skew_seconds: i64) -> bool {
    t - Duration::seconds(skew_seconds) <= now
}

/// Returns true when a `notOnOrAfter` condition with value `t` is still
/// valid: `t + skew > now` (strict, per the profile's "on or after").
#[must_use]
pub fn not_on_or_after_ok(t: DateTime<Utc>, now: DateTime<Utc>, skew_seconds: i64) -> bool {
    t + Duration::seconds(skew_seconds) > now
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn within_window() {
        let now = now();
        assert!(is_within(now - Duration::seconds(10), 3600, 0, now));
        assert!(!is_within(now - Duration::seconds(7200), 3600, 0, now));
        assert!(!is_within(now + Duration::seconds(60), 3600, 0, now));
    }

    #[test]
    fn skew_widens_the_window() {
        let now = now();
        assert!(!is_within(now + Duration::seconds(60), 3600, 0, now));
        assert!(is_within(now + Duration::seconds(60), 3600, 120, now));
    }

    #[test]
    fn non_positive_lifetime_disables_the_window() {
        let now = now();
        assert!(is_within(now - Duration::days(365), 0, 0, now));
        assert!(is_within(now + Duration::days(365), -1, 0, now));
    }

    #[test]
    fn not_before_boundary_is_inclusive() {
        let now = now();
        let skew = 30;
        // t == now − skew is exactly on the boundary and accepted.
        assert!(not_before_ok(now - Duration::seconds(skew), now, skew));
        assert!(not_before_ok(now, now, skew));
        assert!(!not_before_ok(now + Duration::seconds(skew + 1), now, skew));
    }

    #[test]
    fn not_on_or_after_boundary_is_exclusive() {
        let now = now();
        // t == now is expired under zero skew.
        assert!(!not_on_or_after_ok(now, now, 0));
        assert!(not_on_or_after_ok(now + Duration::seconds(1), now, 0));
        assert!(not_on_or_after_ok(now, now, 1));
    }
}
