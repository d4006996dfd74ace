//! Shared fixtures for the database-backed tests.
//!
//! Each test gets a fresh database provisioned by `#[sqlx::test]` from the
//! storefront migrations, so fixtures only need to seed rows, never clean up.

use rust_decimal::Decimal;
use sqlx::PgPool;

use seth_traders_core::{Email, ProductId};
use seth_traders_storefront::db::UserRepository;
use seth_traders_storefront::models::User;

/// Seed an unverified credentials account.
///
/// The hash is a placeholder; these tests never check passwords.
pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    let email = Email::parse(email).expect("valid test email");
    UserRepository::new(pool)
        .create_with_password("Test User", &email, "$argon2id$test-placeholder")
        .await
        .expect("create user")
}

/// Seed a catalog product and return its ID.
pub async fn seed_product(pool: &PgPool, price: Decimal) -> ProductId {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO products (name, description, price) VALUES ($1, NULL, $2) RETURNING id",
    )
    .bind("Steel Water Bottle")
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("insert product");

    ProductId::new(id)
}
