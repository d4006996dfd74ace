//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`.
//!
//! Responses are JSON. Lockout and throttle rejections carry machine-readable
//! fields (`wait_seconds`, `locked_until`, `attempts_left`) so clients can
//! render countdowns without parsing prose.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order or payment operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        let (status, body) = self.response_parts();
        (status, Json(body)).into_response()
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Notify(_)
            ),
            Self::Order(err) => {
                matches!(err, OrderError::Repository(_) | OrderError::Gateway(_))
            }
            _ => false,
        }
    }

    fn response_parts(&self) -> (StatusCode, serde_json::Value) {
        match self {
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal server error" }),
            ),
            Self::Auth(err) => auth_response(err),
            Self::Order(err) => order_response(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        }
    }
}

fn auth_response(err: &AuthError) -> (StatusCode, serde_json::Value) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "invalid email or password" }),
        ),
        AuthError::WrongPassword { attempts_left } => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "invalid email or password", "attempts_left": attempts_left }),
        ),
        AuthError::WrongPasswordLastAttempt => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "invalid email or password", "attempts_left": 1, "last_attempt": true }),
        ),
        AuthError::UserNotFound => (
            StatusCode::NOT_FOUND,
            json!({ "error": "account not found" }),
        ),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            json!({ "error": "an account with this email already exists" }),
        ),
        AuthError::InvalidEmail(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "invalid email address" }),
        ),
        AuthError::WeakPassword { min } => (
            StatusCode::BAD_REQUEST,
            json!({ "error": format!("password must be at least {min} characters") }),
        ),
        AuthError::AccountNotVerified => (
            StatusCode::FORBIDDEN,
            json!({ "error": "account is not verified", "verification_required": true }),
        ),
        AuthError::ExternalProviderAccount => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "this account signs in through an external provider" }),
        ),
        AuthError::AccountLocked { until } => (
            StatusCode::FORBIDDEN,
            json!({ "error": "account is locked", "locked_until": until }),
        ),
        AuthError::ResendThrottled { wait_seconds } => (
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": "please wait before requesting another code", "wait_seconds": wait_seconds }),
        ),
        AuthError::VerificationLocked { until } => (
            StatusCode::FORBIDDEN,
            json!({ "error": "verification is locked", "locked_until": until }),
        ),
        AuthError::CodeExpired => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "verification code has expired", "expired": true }),
        ),
        AuthError::WrongCode { attempts_left } => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "wrong verification code", "attempts_left": attempts_left }),
        ),
        AuthError::WrongCodeLastAttempt => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "wrong verification code", "attempts_left": 1, "last_attempt": true }),
        ),
        AuthError::WrongCodeNowLocked { until } => (
            StatusCode::FORBIDDEN,
            json!({ "error": "too many wrong codes", "locked_until": until }),
        ),
        AuthError::NoPendingVerification => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "no pending verification for this account" }),
        ),
        AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Notify(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal server error" }),
        ),
    }
}

fn order_response(err: &OrderError) -> (StatusCode, serde_json::Value) {
    match err {
        OrderError::EmptyCart => (StatusCode::BAD_REQUEST, json!({ "error": "cart is empty" })),
        OrderError::InvalidQuantity => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "quantity must be at least 1" }),
        ),
        OrderError::ProductNotFound(id) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": format!("product {id} not found") }),
        ),
        OrderError::Amount => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal server error" }),
        ),
        OrderError::OrderNotFound => {
            (StatusCode::NOT_FOUND, json!({ "error": "order not found" }))
        }
        OrderError::SignatureMismatch => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "signature verification failed" }),
        ),
        OrderError::MalformedWebhook(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "malformed payload" }),
        ),
        OrderError::Gateway(_) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": "payment gateway error" }),
        ),
        OrderError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal server error" }),
        ),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn throttled_response_carries_wait_seconds() {
        let err = AppError::Auth(AuthError::ResendThrottled { wait_seconds: 42 });
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["wait_seconds"], 42);
    }

    #[test]
    fn locked_response_carries_expiry() {
        let until = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let err = AppError::Auth(AuthError::AccountLocked { until });
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["locked_until"].is_string());
    }

    #[test]
    fn wrong_code_response_carries_attempts_left() {
        let err = AppError::Auth(AuthError::WrongCode { attempts_left: 3 });
        let (_, body) = err.response_parts();
        assert_eq!(body["attempts_left"], 3);
    }

    #[test]
    fn wrong_password_response_carries_attempts_left() {
        let err = AppError::Auth(AuthError::WrongPassword { attempts_left: 2 });
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["attempts_left"], 2);

        let err = AppError::Auth(AuthError::WrongPasswordLastAttempt);
        let (_, body) = err.response_parts();
        assert_eq!(body["attempts_left"], 1);
        assert_eq!(body["last_attempt"], true);
    }

    #[test]
    fn database_details_are_not_exposed() {
        let err = AppError::Database(RepositoryError::NotFound);
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }
}
