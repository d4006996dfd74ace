//! Product and order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use seth_traders_core::{OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId};

/// A catalog product.
///
/// Catalog management is out of scope for this service; products are read
/// only to snapshot prices at order time and for listing.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Price in rupees.
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// An order.
///
/// Mutated by exactly two independent writers after creation: the client
/// checkout callback and the gateway webhook. Both go through conditional
/// updates keyed on `payment_status`, so whichever lands first wins and
/// `captured` can never be overwritten.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Total in rupees, snapshotted at order time.
    pub total_amount: Decimal,
    /// Gateway order reference, set at creation.
    pub razorpay_order_id: String,
    /// Gateway payment reference, set once a confirmation arrives.
    pub razorpay_payment_id: Option<String>,
    /// Signature supplied by the checkout callback, stored for audit.
    pub razorpay_signature: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// A line item within an order.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price in rupees at the time the order was placed.
    pub price_at_order: Decimal,
}
