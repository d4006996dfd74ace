//! OTP verification state machine.
//!
//! The check sequence is fixed: lock, then expiry, then code comparison. An
//! expired code never consumes a guess attempt, and the attempt budget is
//! cumulative across resends. A served-out lock restarts the streak, so one
//! wrong code after the lock lapses does not instantly re-lock.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::PendingVerification;

/// What a wrong code costs the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchSeverity {
    /// This miss consumed the last attempt; the record is now locked.
    NowLocked { until: DateTime<Utc> },
    /// One attempt remains after this miss.
    LastAttempt,
    /// More than one attempt remains.
    Remaining { attempts_left: i32 },
}

/// Result of evaluating a submitted code against the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTransition {
    /// Codes match; the account should be verified and the record removed.
    Verified,
    /// The record is locked; nothing else was evaluated.
    RejectLocked { until: DateTime<Utc> },
    /// The code expired; the attempt counter is not charged.
    RejectExpired,
    /// Wrong code. Carries the new counter value and, when the budget ran
    /// out, the lock to persist.
    Mismatch {
        attempts: i32,
        lock_until: Option<DateTime<Utc>>,
        severity: MismatchSeverity,
    },
}

/// Evaluate a code submission. Pure; the caller persists the transition.
#[must_use]
pub fn evaluate_check(
    record: &PendingVerification,
    submitted: &str,
    now: DateTime<Utc>,
    max_attempts: i32,
    lock_duration: Duration,
) -> CheckTransition {
    if let Some(until) = record.locked_until
        && until > now
    {
        return CheckTransition::RejectLocked { until };
    }

    if record.expires_at < now {
        return CheckTransition::RejectExpired;
    }

    if record.code == submitted {
        return CheckTransition::Verified;
    }

    // A lapsed lock means the previous streak was served out.
    let prior = if record.locked_until.is_some_and(|until| until <= now) {
        0
    } else {
        record.attempts
    };

    let attempts = prior + 1;
    if attempts >= max_attempts {
        let until = now + lock_duration;
        return CheckTransition::Mismatch {
            attempts,
            lock_until: Some(until),
            severity: MismatchSeverity::NowLocked { until },
        };
    }

    let attempts_left = max_attempts - attempts;
    let severity = if attempts_left == 1 {
        MismatchSeverity::LastAttempt
    } else {
        MismatchSeverity::Remaining { attempts_left }
    };

    CheckTransition::Mismatch {
        attempts,
        lock_until: None,
        severity,
    }
}

/// Generate a six-digit verification code.
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..=999_999);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use seth_traders_core::UserId;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record(code: &str, attempts: i32, locked_until: Option<DateTime<Utc>>) -> PendingVerification {
        PendingVerification {
            user_id: UserId::new(1),
            code: code.to_string(),
            expires_at: at(60),
            last_sent_at: at(0),
            attempts,
            locked_until,
        }
    }

    #[test]
    fn correct_code_verifies() {
        let r = record("123456", 0, None);
        let t = evaluate_check(&r, "123456", at(10), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::Verified);
    }

    #[test]
    fn lock_is_checked_before_expiry_and_code() {
        let r = record("123456", 5, Some(at(7200)));
        let t = evaluate_check(&r, "123456", at(100), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::RejectLocked { until: at(7200) });
    }

    #[test]
    fn expired_lock_no_longer_blocks() {
        let r = record("123456", 4, Some(at(5)));
        let t = evaluate_check(&r, "123456", at(10), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::Verified);
    }

    #[test]
    fn wrong_code_after_lapsed_lock_restarts_count() {
        let r = record("123456", 5, Some(at(5)));
        let t = evaluate_check(&r, "000000", at(10), 5, Duration::hours(24));
        assert_eq!(
            t,
            CheckTransition::Mismatch {
                attempts: 1,
                lock_until: None,
                severity: MismatchSeverity::Remaining { attempts_left: 4 },
            }
        );
    }

    #[test]
    fn expired_code_does_not_charge_an_attempt() {
        let r = record("123456", 2, None);
        let t = evaluate_check(&r, "000000", at(90), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::RejectExpired);
    }

    #[test]
    fn code_at_the_exact_expiry_instant_still_verifies() {
        let r = record("123456", 0, None);
        let t = evaluate_check(&r, "123456", at(60), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::Verified);
    }

    #[test]
    fn correct_code_past_expiry_is_rejected() {
        let r = record("123456", 0, None);
        let t = evaluate_check(&r, "123456", at(61), 5, Duration::hours(24));
        assert_eq!(t, CheckTransition::RejectExpired);
    }

    #[test]
    fn wrong_code_increments_counter() {
        let r = record("123456", 0, None);
        let t = evaluate_check(&r, "654321", at(10), 5, Duration::hours(24));
        assert_eq!(
            t,
            CheckTransition::Mismatch {
                attempts: 1,
                lock_until: None,
                severity: MismatchSeverity::Remaining { attempts_left: 4 },
            }
        );
    }

    #[test]
    fn penultimate_miss_warns_last_attempt() {
        let r = record("123456", 3, None);
        let t = evaluate_check(&r, "654321", at(10), 5, Duration::hours(24));
        assert_eq!(
            t,
            CheckTransition::Mismatch {
                attempts: 4,
                lock_until: None,
                severity: MismatchSeverity::LastAttempt,
            }
        );
    }

    #[test]
    fn final_miss_locks_the_record() {
        let r = record("123456", 4, None);
        let t = evaluate_check(&r, "654321", at(10), 5, Duration::hours(24));
        let until = at(10) + Duration::hours(24);
        assert_eq!(
            t,
            CheckTransition::Mismatch {
                attempts: 5,
                lock_until: Some(until),
                severity: MismatchSeverity::NowLocked { until },
            }
        );
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }
}
