//! Resend throttling.
//!
//! Pure decision over the last-send timestamp and an optional lock. Callers
//! pass `now` in explicitly so tests can pin the clock.

use chrono::{DateTime, Duration, Utc};

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// The action may proceed.
    Allowed,
    /// The minimum interval has not elapsed yet.
    MustWait {
        /// Whole seconds remaining, rounded up so the client never retries
        /// a second too early.
        seconds: i64,
    },
    /// The record is locked outright.
    LockedUntil(DateTime<Utc>),
}

/// Decide whether a resend-style action may proceed.
///
/// A lock takes precedence over the interval check. `last_action` of `None`
/// means the action has never happened and is always allowed (absent a lock).
#[must_use]
pub fn check(
    last_action: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> ThrottleDecision {
    if let Some(until) = locked_until
        && until > now
    {
        return ThrottleDecision::LockedUntil(until);
    }

    let Some(last) = last_action else {
        return ThrottleDecision::Allowed;
    };

    let elapsed = now - last;
    if elapsed >= min_interval {
        return ThrottleDecision::Allowed;
    }

    let remaining_ms = (min_interval - elapsed).num_milliseconds();
    ThrottleDecision::MustWait {
        seconds: (remaining_ms + 999) / 1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_action_is_allowed() {
        let decision = check(None, None, at(0), Duration::seconds(60));
        assert_eq!(decision, ThrottleDecision::Allowed);
    }

    #[test]
    fn inside_interval_must_wait() {
        let decision = check(Some(at(0)), None, at(20), Duration::seconds(60));
        assert_eq!(decision, ThrottleDecision::MustWait { seconds: 40 });
    }

    #[test]
    fn wait_rounds_partial_seconds_up() {
        let last = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let now = Utc.timestamp_millis_opt(1_700_000_000_500).unwrap();
        let decision = check(Some(last), None, now, Duration::seconds(60));
        assert_eq!(decision, ThrottleDecision::MustWait { seconds: 60 });
    }

    #[test]
    fn exactly_at_interval_is_allowed() {
        let decision = check(Some(at(0)), None, at(60), Duration::seconds(60));
        assert_eq!(decision, ThrottleDecision::Allowed);
    }

    #[test]
    fn active_lock_wins_over_elapsed_interval() {
        let decision = check(
            Some(at(0)),
            Some(at(3600)),
            at(120),
            Duration::seconds(60),
        );
        assert_eq!(decision, ThrottleDecision::LockedUntil(at(3600)));
    }

    #[test]
    fn expired_lock_is_ignored() {
        let decision = check(Some(at(0)), Some(at(30)), at(90), Duration::seconds(60));
        assert_eq!(decision, ThrottleDecision::Allowed);
    }
}
