//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use seth_traders_core::{UserId, UserRole};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub email: String,
    /// The account cannot log in until the emailed code is confirmed.
    pub verification_required: bool,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

/// `POST /auth/register`
///
/// Creates an unverified account and emails the first verification code.
/// Re-registering an email that never finished verification refreshes the
/// code instead of conflicting.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let auth = AuthService::new(
        state.pool(),
        state.email(),
        &state.config().otp,
        &state.config().login,
    );

    let user = auth
        .register_or_refresh(name, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email.to_string(),
            verification_required: true,
        }),
    ))
}

/// `POST /auth/login`
///
/// Password login. Rotates the session ID and stores the user identity.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.email(),
        &state.config().otp,
        &state.config().login,
    );

    let user = auth.login(&body.email, &body.password).await?;

    // Session fixation defense: new session ID on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email.to_string(),
        role: user.role,
    }))
}

/// `POST /auth/logout`
///
/// Destroys the session. Always succeeds, even without one.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}
