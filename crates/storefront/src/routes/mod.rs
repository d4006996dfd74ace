//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/register             - Create an account, sends an OTP email
//! POST /auth/login                - Password login
//! POST /auth/logout               - Destroy the session
//! POST /auth/otp/verify           - Submit a verification code
//! POST /auth/otp/resend           - Request a fresh verification code
//!
//! # Catalog
//! GET  /products                  - Product listing
//!
//! # Orders (requires auth)
//! POST /orders                    - Create an order and its gateway twin
//! GET  /orders                    - Order history with items
//! POST /payments/razorpay/verify  - Checkout widget callback
//!
//! # Webhooks
//! POST /webhooks/razorpay         - Razorpay event delivery
//! ```

pub mod auth;
pub mod orders;
pub mod products;
pub mod verification;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router (without the health endpoints, which the
/// binary mounts directly).
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route("/products", get(products::list))
        .route("/orders", post(orders::create).get(orders::list))
        .route("/payments/razorpay/verify", post(orders::verify_payment))
        .route("/webhooks/razorpay", post(webhooks::razorpay))
}

/// Create the auth routes router.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/otp/verify", post(verification::verify))
        .route("/otp/resend", post(verification::resend))
}
