//! Order and payment flows.
//!
//! Three entry points: checkout (create a local order plus its gateway
//! twin), the client callback after the checkout widget closes, and the
//! webhook. The callback and webhook are independent writers over the same
//! order row; all state transitions go through the guarded updates in
//! `OrderRepository`, so whichever lands second degrades to a no-op.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use seth_traders_core::{OrderId, Price, ProductId, UserId};

use crate::config::RazorpayConfig;
use crate::db::RepositoryError;
use crate::db::orders::{NewOrderItem, OrderRepository};
use crate::db::products::ProductRepository;
use crate::models::{Order, OrderItem};
use crate::razorpay::client::{GatewayError, RazorpayClient};
use crate::razorpay::signature;
use crate::razorpay::webhook::{EventKind, WebhookEvent};

/// Errors from checkout and payment confirmation.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("order total is not representable in paise")]
    Amount,

    #[error("order not found")]
    OrderNotFound,

    #[error("payment signature verification failed")]
    SignatureMismatch,

    #[error("webhook payload is malformed: {0}")]
    MalformedWebhook(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A line in a checkout request.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// What the client needs to open the checkout widget.
#[derive(Debug, Clone)]
pub struct CheckoutHandle {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount_minor: i64,
    pub currency: String,
    /// Public key ID for the widget.
    pub key_id: String,
}

/// Outcome of a client payment callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// This callback moved the order to `authorized`.
    Confirmed,
    /// The webhook settled the order first; nothing to do.
    AlreadySettled,
}

/// Order and payment service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    gateway: &'a RazorpayClient,
    razorpay: &'a RazorpayConfig,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        gateway: &'a RazorpayClient,
        razorpay: &'a RazorpayConfig,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            gateway,
            razorpay,
        }
    }

    /// Create an order from a cart and register it with the gateway.
    ///
    /// Prices are snapshotted server-side; the client only sends product IDs
    /// and quantities. The gateway order is created before the local row so
    /// an unpaid local order never exists without a gateway reference.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ProductNotFound` for stale cart lines and
    /// `OrderError::Gateway` if Razorpay rejects the order.
    pub async fn create_order(
        &self,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<CheckoutHandle, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        for line in lines {
            if line.quantity < 1 {
                return Err(OrderError::InvalidQuantity);
            }
            let product = self
                .products
                .get(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            total += product.price * Decimal::from(line.quantity);
            items.push(NewOrderItem {
                product_id: product.id,
                quantity: line.quantity,
                price_at_order: product.price,
            });
        }

        let price = Price::inr(total);
        let amount_minor = price.to_minor_units().ok_or(OrderError::Amount)?;

        let receipt = format!("user-{}-{}", user_id, chrono::Utc::now().timestamp());
        let gateway_order = self
            .gateway
            .create_order(amount_minor, price.currency.code(), &receipt)
            .await?;

        let order = self
            .orders
            .create_with_items(user_id, total, &gateway_order.id, &items)
            .await?;

        tracing::info!(
            order_id = %order.id,
            razorpay_order_id = %gateway_order.id,
            amount_minor,
            "order created"
        );

        Ok(CheckoutHandle {
            order_id: order.id,
            razorpay_order_id: gateway_order.id,
            amount_minor,
            currency: gateway_order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Handle the checkout widget's payment callback.
    ///
    /// The signature covers `"{order_id}|{payment_id}"` under the API key
    /// secret. A valid signature authorizes a still-pending order; an invalid
    /// one fails it and reports the mismatch. If the webhook already settled
    /// the order, a valid callback is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the reference does not belong
    /// to this user, `OrderError::SignatureMismatch` for a bad signature.
    pub async fn confirm_client_payment(
        &self,
        user_id: UserId,
        razorpay_order_id: &str,
        payment_id: &str,
        supplied_signature: &str,
    ) -> Result<CallbackOutcome, OrderError> {
        let order = self
            .orders
            .find_latest_for_user(razorpay_order_id, user_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        // Captured is sticky; nothing a late callback says can change it.
        if order.payment_status.is_captured() {
            return Ok(CallbackOutcome::AlreadySettled);
        }

        let valid = signature::verify_checkout(
            &self.razorpay.key_secret,
            razorpay_order_id,
            payment_id,
            supplied_signature,
        );

        if !valid {
            self.orders
                .mark_failed_if_pending(order.id, payment_id, supplied_signature)
                .await?;
            tracing::warn!(order_id = %order.id, "checkout callback signature mismatch");
            return Err(OrderError::SignatureMismatch);
        }

        let updated = self
            .orders
            .mark_authorized_if_pending(order.id, payment_id, supplied_signature)
            .await?;

        if updated {
            tracing::info!(order_id = %order.id, "payment authorized via checkout callback");
            Ok(CallbackOutcome::Confirmed)
        } else {
            // The webhook beat us to it. Idempotent success.
            Ok(CallbackOutcome::AlreadySettled)
        }
    }

    /// Handle a webhook delivery.
    ///
    /// The signature covers the raw body under the webhook secret and is
    /// checked before the body is parsed. Unknown events and payloads without
    /// an order reference are acknowledged without side effects so the
    /// gateway stops retrying.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::SignatureMismatch` for a bad signature and
    /// `OrderError::MalformedWebhook` if a verified body does not parse.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        supplied_signature: &str,
    ) -> Result<(), OrderError> {
        if !signature::verify(&self.razorpay.webhook_secret, body, supplied_signature) {
            tracing::warn!("webhook signature mismatch");
            return Err(OrderError::SignatureMismatch);
        }

        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|e| OrderError::MalformedWebhook(e.to_string()))?;

        match event.kind() {
            EventKind::PaymentCaptured => {
                let Some(payment) = event.payment() else {
                    tracing::warn!(event = %event.event, "webhook without payment entity");
                    return Ok(());
                };
                let Some(order_ref) = payment.order_id.as_deref() else {
                    tracing::warn!(payment_id = %payment.id, "captured payment without order reference");
                    return Ok(());
                };

                let updated = self
                    .orders
                    .capture_by_gateway_ref(order_ref, &payment.id)
                    .await?;
                if updated {
                    tracing::info!(razorpay_order_id = %order_ref, "payment captured via webhook");
                } else {
                    tracing::debug!(razorpay_order_id = %order_ref, "capture webhook was a no-op");
                }
            }
            EventKind::PaymentFailed => {
                let Some(payment) = event.payment() else {
                    tracing::warn!(event = %event.event, "webhook without payment entity");
                    return Ok(());
                };
                let Some(order_ref) = payment.order_id.as_deref() else {
                    tracing::warn!(payment_id = %payment.id, "failed payment without order reference");
                    return Ok(());
                };

                let updated = self
                    .orders
                    .fail_by_gateway_ref(order_ref, &payment.id)
                    .await?;
                if updated {
                    tracing::info!(razorpay_order_id = %order_ref, "payment failed via webhook");
                }
            }
            EventKind::Other => {
                tracing::debug!(event = %event.event, "ignoring webhook event");
            }
        }

        Ok(())
    }

    /// List a user's orders with items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_orders(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Vec<OrderItem>)>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }
}
