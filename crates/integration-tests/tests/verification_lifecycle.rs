//! Database-backed tests for the verification record lifecycle: the atomic
//! finalize, the gone-record path, and counter behavior across reissues.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use seth_traders_storefront::db::{RepositoryError, UserRepository, VerificationRepository};

use seth_traders_integration_tests::seed_user;

#[sqlx::test(migrations = "../storefront/migrations")]
async fn finalize_flips_verified_and_removes_the_record(pool: PgPool) {
    let user = seed_user(&pool, "pending@example.com").await;
    assert!(!user.verified);

    let verifications = VerificationRepository::new(&pool);
    let now = Utc::now();
    verifications
        .upsert_code(user.id, "482913", now + Duration::seconds(60), now)
        .await
        .expect("issue code");

    verifications
        .finalize_verification(user.id)
        .await
        .expect("finalize");

    let reloaded = UserRepository::new(&pool)
        .get_by_id(user.id)
        .await
        .expect("query user")
        .expect("user exists");
    assert!(reloaded.verified);
    assert!(
        verifications
            .get(user.id)
            .await
            .expect("query record")
            .is_none()
    );
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn failure_after_finalize_reports_not_found(pool: PgPool) {
    let user = seed_user(&pool, "pending@example.com").await;
    let verifications = VerificationRepository::new(&pool);
    let now = Utc::now();
    verifications
        .upsert_code(user.id, "482913", now + Duration::seconds(60), now)
        .await
        .expect("issue code");
    verifications
        .finalize_verification(user.id)
        .await
        .expect("finalize");

    // The record is gone; a late failure write has nothing to update.
    let err = verifications
        .record_failure(user.id, 1, None)
        .await
        .expect_err("record is gone");
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn reissue_keeps_the_attempt_counter(pool: PgPool) {
    let user = seed_user(&pool, "pending@example.com").await;
    let verifications = VerificationRepository::new(&pool);
    let now = Utc::now();

    verifications
        .upsert_code(user.id, "111111", now + Duration::seconds(60), now)
        .await
        .expect("first code");
    verifications
        .record_failure(user.id, 2, None)
        .await
        .expect("two misses");

    // A resend swaps the code and timestamps but not the counter.
    let later = now + Duration::seconds(90);
    verifications
        .upsert_code(user.id, "222222", later + Duration::seconds(60), later)
        .await
        .expect("reissue");

    let record = verifications
        .get(user.id)
        .await
        .expect("query record")
        .expect("record exists");
    assert_eq!(record.code, "222222");
    assert_eq!(record.attempts, 2);
    // Timestamps round-trip at microsecond precision; compare against the
    // first send rather than for exact equality.
    assert!(record.last_sent_at > now);
}
