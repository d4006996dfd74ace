//! Authentication service.
//!
//! Registration, OTP email verification, and password login with lockout.

mod error;
pub mod guard;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use seth_traders_core::{AuthProvider, Email, UserId};

use crate::config::{LoginGuardConfig, OtpConfig};
use crate::db::RepositoryError;
use crate::db::login_attempts::LoginAttemptRepository;
use crate::db::users::UserRepository;
use crate::db::verifications::VerificationRepository;
use crate::models::User;
use crate::services::email::EmailService;
use crate::services::throttle::{self, ThrottleDecision};
use crate::services::verification::{self, CheckTransition, MismatchSeverity};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles registration, verification-code issue and checking, and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    verifications: VerificationRepository<'a>,
    login_attempts: LoginAttemptRepository<'a>,
    email: &'a EmailService,
    otp: &'a OtpConfig,
    login: &'a LoginGuardConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        email: &'a EmailService,
        otp: &'a OtpConfig,
        login: &'a LoginGuardConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            verifications: VerificationRepository::new(pool),
            login_attempts: LoginAttemptRepository::new(pool),
            email,
            otp,
            login,
        }
    }

    /// Register a new account and send the first verification code.
    ///
    /// Re-submitting for an existing account that never completed
    /// verification does not conflict; it refreshes the code instead,
    /// subject to the resend interval.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email does not parse.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if a verified account owns
    /// the email.
    pub async fn register_or_refresh(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            if existing.verified || existing.provider != AuthProvider::Credentials {
                return Err(AuthError::UserAlreadyExists);
            }
            self.refresh_code(&existing).await?;
            return Ok(existing);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        self.issue_code(&user).await?;

        Ok(user)
    }

    /// Issue a fresh code for a user with an existing pending record,
    /// applying the resend throttle first.
    async fn refresh_code(&self, user: &User) -> Result<(), AuthError> {
        if let Some(record) = self.verifications.get(user.id).await? {
            let now = Utc::now();
            let interval = Duration::seconds(self.otp.resend_interval_seconds);
            match throttle::check(Some(record.last_sent_at), record.locked_until, now, interval) {
                ThrottleDecision::Allowed => {}
                ThrottleDecision::MustWait { seconds } => {
                    return Err(AuthError::ResendThrottled {
                        wait_seconds: seconds,
                    });
                }
                ThrottleDecision::LockedUntil(until) => {
                    return Err(AuthError::VerificationLocked { until });
                }
            }
        }

        self.issue_code(user).await
    }

    /// Issue and send a fresh verification code for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Notify` if the email cannot be sent.
    async fn issue_code(&self, user: &User) -> Result<(), AuthError> {
        let code = verification::generate_code();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.otp.expiry_seconds);

        self.verifications
            .upsert_code(user.id, &code, expires_at, now)
            .await?;

        self.email
            .send_verification_code(&user.email, &user.name, &code)
            .await
            .map_err(|e| AuthError::Notify(e.to_string()))?;

        Ok(())
    }

    /// Resend the verification code, subject to the resend interval.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ResendThrottled` inside the minimum interval.
    /// Returns `AuthError::VerificationLocked` while the record is locked.
    /// Returns `AuthError::NoPendingVerification` if there is nothing to resend.
    pub async fn resend_code(&self, user_id: UserId) -> Result<(), AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.verified {
            return Err(AuthError::NoPendingVerification);
        }

        if self.verifications.get(user.id).await?.is_none() {
            return Err(AuthError::NoPendingVerification);
        }

        self.refresh_code(&user).await
    }

    /// Check a submitted verification code.
    ///
    /// On success the account is marked verified and the pending record
    /// removed atomically.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::VerificationLocked`, `AuthError::CodeExpired`, or a
    /// wrong-code variant depending on the evaluation outcome.
    pub async fn check_code(&self, user_id: UserId, submitted: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.verified {
            return Err(AuthError::NoPendingVerification);
        }

        let record = self
            .verifications
            .get(user.id)
            .await?
            .ok_or(AuthError::NoPendingVerification)?;

        let now = Utc::now();
        let lock = Duration::hours(self.otp.lock_hours);
        match verification::evaluate_check(&record, submitted, now, self.otp.max_attempts, lock) {
            CheckTransition::Verified => {
                self.verifications.finalize_verification(user.id).await?;
                tracing::info!(user_id = %user.id, "account verified");
                Ok(User {
                    verified: true,
                    ..user
                })
            }
            CheckTransition::RejectLocked { until } => {
                Err(AuthError::VerificationLocked { until })
            }
            CheckTransition::RejectExpired => Err(AuthError::CodeExpired),
            CheckTransition::Mismatch {
                attempts,
                lock_until,
                severity,
            } => {
                self.verifications
                    .record_failure(user.id, attempts, lock_until)
                    .await?;

                Err(match severity {
                    MismatchSeverity::NowLocked { until } => {
                        tracing::warn!(user_id = %user.id, "verification locked after repeated wrong codes");
                        AuthError::WrongCodeNowLocked { until }
                    }
                    MismatchSeverity::LastAttempt => AuthError::WrongCodeLastAttempt,
                    MismatchSeverity::Remaining { attempts_left } => {
                        AuthError::WrongCode { attempts_left }
                    }
                })
            }
        }
    }

    /// Login with email and password.
    ///
    /// The lockout guard runs before the password check, so a locked account
    /// rejects even the correct password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountLocked` while the guard lock is active.
    /// Returns `AuthError::AccountNotVerified` for unverified accounts.
    /// Returns `AuthError::InvalidCredentials` for an unknown email;
    /// a bad password on a known account comes back as `WrongPassword` or
    /// `WrongPasswordLastAttempt` carrying the remaining attempts.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let record = self.login_attempts.get(user.id).await?;
        let now = Utc::now();

        if let guard::GuardDecision::Locked { until } = guard::evaluate(record.as_ref(), now) {
            return Err(AuthError::AccountLocked { until });
        }

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::ExternalProviderAccount);
        };

        if verify_password(password, hash).is_err() {
            let transition = guard::on_failure(
                record.as_ref(),
                now,
                self.login.max_attempts,
                Duration::hours(self.login.lock_hours),
            );
            self.login_attempts
                .record_failure(user.id, transition.attempts, transition.locked_until, now)
                .await?;

            return Err(match transition.severity {
                guard::FailureSeverity::NowLocked { until } => {
                    tracing::warn!(user_id = %user.id, "account locked after repeated login failures");
                    AuthError::AccountLocked { until }
                }
                guard::FailureSeverity::LastAttempt => AuthError::WrongPasswordLastAttempt,
                guard::FailureSeverity::Remaining { attempts_left } => {
                    AuthError::WrongPassword { attempts_left }
                }
            });
        }

        if !user.verified {
            return Err(AuthError::AccountNotVerified);
        }

        self.login_attempts.reset(user.id).await?;

        Ok(user)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let err = validate_password("short").unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword { min: 8 }));
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(verify_password("wrong password here", &hash).is_err());
    }

    #[test]
    fn garbage_hash_is_invalid_credentials() {
        let err = verify_password("anything-at-all", "not a phc string").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
