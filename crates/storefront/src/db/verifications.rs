//! Pending-verification (OTP) repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seth_traders_core::UserId;

use super::RepositoryError;
use crate::models::PendingVerification;

/// Repository for OTP records.
pub struct VerificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the pending verification for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
    ) -> Result<Option<PendingVerification>, RepositoryError> {
        let record = sqlx::query_as::<_, PendingVerification>(
            "SELECT user_id, code, expires_at, last_sent_at, attempts, locked_until
             FROM pending_verifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Store a freshly issued code.
    ///
    /// Creates the record with a zero attempt counter, or overwrites the code
    /// and timestamps of an existing one. The attempt counter is deliberately
    /// left untouched on conflict: resends do not refill the guess budget.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_code(
        &self,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO pending_verifications (user_id, code, expires_at, last_sent_at, attempts)
             VALUES ($1, $2, $3, $4, 0)
             ON CONFLICT (user_id) DO UPDATE
             SET code = EXCLUDED.code,
                 expires_at = EXCLUDED.expires_at,
                 last_sent_at = EXCLUDED.last_sent_at",
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .bind(sent_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a wrong submission: bump the counter and set the lock if the
    /// maximum was reached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record disappeared.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_failure(
        &self,
        user_id: UserId,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE pending_verifications
             SET attempts = $2, locked_until = $3
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(attempts)
        .bind(locked_until)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Finalize a successful verification.
    ///
    /// Flips the account's `verified` flag and deletes the pending record in
    /// one transaction, so a crash cannot leave a verified account with a
    /// dangling OTP record or the reverse.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user row is gone.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn finalize_verification(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM pending_verifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
