//! Account, verification, and login-guard models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use seth_traders_core::{AuthProvider, Email, UserId, UserRole};

/// An account.
///
/// `password_hash` is `None` for accounts that came in through an external
/// identity provider; those accounts are created pre-verified and can never
/// log in with a password.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique).
    pub email: Email,
    /// Argon2 hash, absent for external-provider accounts.
    pub password_hash: Option<String>,
    /// Whether the email has been verified.
    pub verified: bool,
    /// Account role.
    pub role: UserRole,
    /// How the account was created.
    pub provider: AuthProvider,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The OTP record for an unverified account.
///
/// Exists only while the owning account is unverified; deleted in the same
/// transaction that flips the account's `verified` flag.
#[derive(Debug, Clone, FromRow)]
pub struct PendingVerification {
    /// Owning account.
    pub user_id: UserId,
    /// Current 6-digit code, fixed-width decimal.
    pub code: String,
    /// Instant past which the code is rejected.
    pub expires_at: DateTime<Utc>,
    /// When the code was last (re)sent, for resend throttling.
    pub last_sent_at: DateTime<Utc>,
    /// Wrong submissions so far, cumulative across resends.
    pub attempts: i32,
    /// Set when wrong submissions reached the maximum.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Failed-login counter for an account.
///
/// Created lazily on the first failed login; reset to zero (but kept) on
/// success.
#[derive(Debug, Clone, FromRow)]
pub struct LoginAttempt {
    /// Owning account.
    pub user_id: UserId,
    /// Consecutive failed logins.
    pub attempts: i32,
    /// Set when failures reached the maximum.
    pub locked_until: Option<DateTime<Utc>>,
    /// When the last attempt (of any outcome) happened.
    pub last_attempt_at: DateTime<Utc>,
}
