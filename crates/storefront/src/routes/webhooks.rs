//! Webhook route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// `POST /webhooks/razorpay`
///
/// Body is taken raw; the signature covers the exact bytes sent, so the
/// payload must not be deserialized before verification.
pub async fn razorpay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing signature header".to_string()))?;

    let service = OrderService::new(state.pool(), state.razorpay(), &state.config().razorpay);
    service.handle_webhook(&body, signature).await?;

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}
