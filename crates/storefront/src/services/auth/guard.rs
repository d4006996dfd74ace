//! Login attempt guard.
//!
//! Pure evaluation of the failed-login counter. The guard is consulted
//! before the password is checked, so a locked account rejects even a
//! correct password.

use chrono::{DateTime, Duration, Utc};

use crate::models::LoginAttempt;

/// Outcome of a login-guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed to the password check.
    Allowed,
    /// The account is locked; reject without checking the password.
    Locked { until: DateTime<Utc> },
}

/// What a failed password check costs the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSeverity {
    /// This failure consumed the last attempt; the account is now locked.
    NowLocked { until: DateTime<Utc> },
    /// One attempt remains after this failure.
    LastAttempt,
    /// More than one attempt remains.
    Remaining { attempts_left: i32 },
}

/// Transition to persist after a failed password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTransition {
    pub attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub severity: FailureSeverity,
}

/// Decide whether a login may proceed to the password check.
///
/// An expired lock does not block, but the stale counter stays until a
/// success resets it or a further failure overwrites it.
#[must_use]
pub fn evaluate(record: Option<&LoginAttempt>, now: DateTime<Utc>) -> GuardDecision {
    if let Some(record) = record
        && let Some(until) = record.locked_until
        && until > now
    {
        return GuardDecision::Locked { until };
    }

    GuardDecision::Allowed
}

/// Compute the counter transition for a failed password check.
///
/// Reaching `max_attempts` sets the lock; failures past an expired lock
/// restart the count at one.
#[must_use]
pub fn on_failure(
    record: Option<&LoginAttempt>,
    now: DateTime<Utc>,
    max_attempts: i32,
    lock_duration: Duration,
) -> FailureTransition {
    let prior = match record {
        // A lapsed lock means the previous streak was served out.
        Some(r) if r.locked_until.is_some_and(|until| until <= now) => 0,
        Some(r) => r.attempts,
        None => 0,
    };

    let attempts = prior + 1;
    if attempts >= max_attempts {
        let until = now + lock_duration;
        return FailureTransition {
            attempts,
            locked_until: Some(until),
            severity: FailureSeverity::NowLocked { until },
        };
    }

    let attempts_left = max_attempts - attempts;
    let severity = if attempts_left == 1 {
        FailureSeverity::LastAttempt
    } else {
        FailureSeverity::Remaining { attempts_left }
    };

    FailureTransition {
        attempts,
        locked_until: None,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use seth_traders_core::UserId;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record(attempts: i32, locked_until: Option<DateTime<Utc>>) -> LoginAttempt {
        LoginAttempt {
            user_id: UserId::new(1),
            attempts,
            locked_until,
            last_attempt_at: at(0),
        }
    }

    #[test]
    fn no_record_is_allowed() {
        assert_eq!(evaluate(None, at(0)), GuardDecision::Allowed);
    }

    #[test]
    fn active_lock_blocks() {
        let r = record(5, Some(at(3600)));
        assert_eq!(
            evaluate(Some(&r), at(10)),
            GuardDecision::Locked { until: at(3600) }
        );
    }

    #[test]
    fn expired_lock_allows() {
        let r = record(5, Some(at(5)));
        assert_eq!(evaluate(Some(&r), at(10)), GuardDecision::Allowed);
    }

    #[test]
    fn first_failure_starts_at_one() {
        let t = on_failure(None, at(0), 5, Duration::hours(24));
        assert_eq!(
            t,
            FailureTransition {
                attempts: 1,
                locked_until: None,
                severity: FailureSeverity::Remaining { attempts_left: 4 },
            }
        );
    }

    #[test]
    fn penultimate_failure_warns_last_attempt() {
        let r = record(3, None);
        let t = on_failure(Some(&r), at(0), 5, Duration::hours(24));
        assert_eq!(t.attempts, 4);
        assert_eq!(t.locked_until, None);
        assert_eq!(t.severity, FailureSeverity::LastAttempt);
    }

    #[test]
    fn failure_at_threshold_locks() {
        let r = record(4, None);
        let t = on_failure(Some(&r), at(0), 5, Duration::hours(24));
        let until = at(0) + Duration::hours(24);
        assert_eq!(t.attempts, 5);
        assert_eq!(t.locked_until, Some(until));
        assert_eq!(t.severity, FailureSeverity::NowLocked { until });
    }

    #[test]
    fn failure_after_expired_lock_restarts_count() {
        let r = record(5, Some(at(5)));
        let t = on_failure(Some(&r), at(10), 5, Duration::hours(24));
        assert_eq!(
            t,
            FailureTransition {
                attempts: 1,
                locked_until: None,
                severity: FailureSeverity::Remaining { attempts_left: 4 },
            }
        );
    }
}
