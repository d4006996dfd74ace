//! Authentication error types.

use chrono::{DateTime, Utc};

use seth_traders_core::EmailError;

use crate::db::RepositoryError;

/// Errors from registration, verification, and login flows.
///
/// Variants carry the data the HTTP layer needs to build a useful response
/// (wait times, lock expiries, remaining attempts) so handlers never have to
/// recompute them.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    #[error("no account found for this email")]
    UserNotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("wrong password, {attempts_left} attempts remaining")]
    WrongPassword { attempts_left: i32 },

    #[error("wrong password, this is your last attempt")]
    WrongPasswordLastAttempt,

    #[error("account is not verified yet")]
    AccountNotVerified,

    #[error("account is locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("this account signs in through an external provider")]
    ExternalProviderAccount,

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("please wait {wait_seconds}s before requesting another code")]
    ResendThrottled { wait_seconds: i64 },

    #[error("verification is locked until {until}")]
    VerificationLocked { until: DateTime<Utc> },

    #[error("verification code has expired")]
    CodeExpired,

    #[error("wrong verification code, {attempts_left} attempts remaining")]
    WrongCode { attempts_left: i32 },

    #[error("wrong verification code, this is your last attempt")]
    WrongCodeLastAttempt,

    #[error("too many wrong codes, verification locked until {until}")]
    WrongCodeNowLocked { until: DateTime<Utc> },

    #[error("no pending verification for this account")]
    NoPendingVerification,

    #[error("password hashing failed")]
    PasswordHash,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to send verification email: {0}")]
    Notify(String),
}
