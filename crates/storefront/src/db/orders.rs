//! Order repository.
//!
//! Payment-state writes here are conditional updates guarded by the row's
//! current `payment_status`. The checkout callback and the webhook race to
//! confirm the same order; the guard predicate makes the two writers
//! commutative and keeps `captured` sticky. The store's transaction isolation
//! is the only concurrency primitive relied upon, since the two writers may
//! be different processes.

use rust_decimal::Decimal;
use sqlx::PgPool;

use seth_traders_core::{OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, total_amount, razorpay_order_id, razorpay_payment_id, \
                             razorpay_signature, status, payment_status, created_at";

/// A line to persist with a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price snapshot at order time.
    pub price_at_order: Decimal,
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order and its items in one transaction.
    ///
    /// The order starts at `pending`/`pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// persisted in that case.
    pub async fn create_with_items(
        &self,
        user_id: UserId,
        total_amount: Decimal,
        razorpay_order_id: &str,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, total_amount, razorpay_order_id, status, payment_status)
             VALUES ($1, $2, $3, 'pending', 'pending')
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(total_amount)
        .bind(razorpay_order_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price_at_order)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price_at_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Find the most recent order for a gateway reference owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_latest_for_user(
        &self,
        razorpay_order_id: &str,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE razorpay_order_id = $1 AND user_id = $2
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(razorpay_order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// List a user's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Vec<OrderItem>)>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = sqlx::query_as::<_, OrderItem>(
                "SELECT id, order_id, product_id, quantity, price_at_order
                 FROM order_items WHERE order_id = $1
                 ORDER BY id",
            )
            .bind(order.id)
            .fetch_all(self.pool)
            .await?;
            result.push((order, items));
        }

        Ok(result)
    }

    /// Checkout-callback confirmation: move a still-pending order to
    /// `authorized`/`processing`.
    ///
    /// Returns `false` when the guard matched no row, meaning the webhook got
    /// there first; callers treat that as success.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_authorized_if_pending(
        &self,
        order_id: OrderId,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'authorized', status = 'processing',
                 razorpay_payment_id = $2, razorpay_signature = $3
             WHERE id = $1 AND payment_status = 'pending'",
        )
        .bind(order_id)
        .bind(payment_id)
        .bind(signature)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checkout-callback rejection: move a still-pending order to
    /// `failed`/`cancelled` after a bad signature.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_failed_if_pending(
        &self,
        order_id: OrderId,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'failed', status = 'cancelled',
                 razorpay_payment_id = $2, razorpay_signature = $3
             WHERE id = $1 AND payment_status = 'pending'",
        )
        .bind(order_id)
        .bind(payment_id)
        .bind(signature)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Webhook capture: settle the order matched by gateway reference unless
    /// it is already captured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn capture_by_gateway_ref(
        &self,
        razorpay_order_id: &str,
        payment_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'captured', status = 'processing',
                 razorpay_payment_id = $2
             WHERE razorpay_order_id = $1 AND payment_status <> 'captured'",
        )
        .bind(razorpay_order_id)
        .bind(payment_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Webhook failure: cancel the order matched by gateway reference unless
    /// it is already captured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn fail_by_gateway_ref(
        &self,
        razorpay_order_id: &str,
        payment_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'failed', status = 'cancelled',
                 razorpay_payment_id = $2
             WHERE razorpay_order_id = $1 AND payment_status <> 'captured'",
        )
        .bind(razorpay_order_id)
        .bind(payment_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
