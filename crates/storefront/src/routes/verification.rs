//! OTP verification route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use seth_traders_core::UserId;

use crate::error::Result;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Code submission body.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub user_id: UserId,
    pub code: String,
}

/// Resend request body.
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub sent: bool,
}

/// `POST /auth/otp/verify`
///
/// Checks a submitted code. On success the account can log in.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.email(),
        &state.config().otp,
        &state.config().login,
    );

    auth.check_code(body.user_id, body.code.trim()).await?;

    Ok(Json(VerifyResponse { verified: true }))
}

/// `POST /auth/otp/resend`
///
/// Issues a fresh code, subject to the resend interval.
pub async fn resend(
    State(state): State<AppState>,
    Json(body): Json<ResendRequest>,
) -> Result<Json<ResendResponse>> {
    let auth = AuthService::new(
        state.pool(),
        state.email(),
        &state.config().otp,
        &state.config().login,
    );

    auth.resend_code(body.user_id).await?;

    Ok(Json(ResendResponse { sent: true }))
}
