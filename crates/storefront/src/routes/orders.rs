//! Order and payment route handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use seth_traders_core::{OrderId, OrderStatus, PaymentStatus, ProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderItem};
use crate::services::orders::{CallbackOutcome, CartLine, OrderService};
use crate::state::AppState;

/// Checkout request body: one product and a quantity.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Everything the client needs to open the checkout widget.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// Checkout widget callback body. Field names follow the widget's handler
/// payload.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
}

/// One order in the history listing.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl OrderView {
    fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            total_amount: order.total_amount,
            status: order.status,
            payment_status: order.payment_status,
            created_at: order.created_at,
            items,
        }
    }
}

/// `POST /orders`
///
/// Creates a local order and its gateway twin from the submitted cart.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let lines = [CartLine {
        product_id: body.product_id,
        quantity: body.quantity,
    }];

    let service = OrderService::new(state.pool(), state.razorpay(), &state.config().razorpay);
    let handle = service.create_order(user.id, &lines).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: handle.order_id,
            razorpay_order_id: handle.razorpay_order_id,
            amount: handle.amount_minor,
            currency: handle.currency,
            key_id: handle.key_id,
        }),
    ))
}

/// `GET /orders`
///
/// The authenticated user's order history, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let service = OrderService::new(state.pool(), state.razorpay(), &state.config().razorpay);
    let orders = service.list_orders(user.id).await?;

    let views = orders
        .into_iter()
        .map(|(order, items)| OrderView::from_parts(order, items))
        .collect();

    Ok(Json(views))
}

/// `POST /payments/razorpay/verify`
///
/// Checkout widget callback. Verifies the signature and authorizes the
/// order; reports `already_settled` when the webhook landed first.
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let service = OrderService::new(state.pool(), state.razorpay(), &state.config().razorpay);
    let outcome = service
        .confirm_client_payment(
            user.id,
            &body.razorpay_order_id,
            &body.razorpay_payment_id,
            &body.razorpay_signature,
        )
        .await?;

    let status = match outcome {
        CallbackOutcome::Confirmed => "authorized",
        CallbackOutcome::AlreadySettled => "already_settled",
    };

    Ok(Json(VerifyPaymentResponse { status }))
}
