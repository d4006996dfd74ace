//! Login-attempt guard repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seth_traders_core::UserId;

use super::RepositoryError;
use crate::models::LoginAttempt;

/// Repository for failed-login counters.
pub struct LoginAttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LoginAttemptRepository<'a> {
    /// Create a new login-attempt repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the guard record for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<LoginAttempt>, RepositoryError> {
        let record = sqlx::query_as::<_, LoginAttempt>(
            "SELECT user_id, attempts, locked_until, last_attempt_at
             FROM login_attempts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Record a failed login (lazy upsert).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_failure(
        &self,
        user_id: UserId,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO login_attempts (user_id, attempts, locked_until, last_attempt_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE
             SET attempts = EXCLUDED.attempts,
                 locked_until = EXCLUDED.locked_until,
                 last_attempt_at = EXCLUDED.last_attempt_at",
        )
        .bind(user_id)
        .bind(attempts)
        .bind(locked_until)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Reset the counter and clear the lock after a successful login.
    ///
    /// The record itself is kept at zero rather than deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reset(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE login_attempts SET attempts = 0, locked_until = NULL WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
