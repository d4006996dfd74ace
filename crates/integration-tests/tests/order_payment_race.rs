//! The checkout callback and the gateway webhook are independent writers over
//! the same order row. These tests drive both arrival orders through the
//! guarded updates and check that they settle at the same fixed point, with
//! `captured` never overwritten.

use rust_decimal::Decimal;
use sqlx::PgPool;

use seth_traders_core::{OrderStatus, PaymentStatus};
use seth_traders_storefront::db::OrderRepository;
use seth_traders_storefront::db::orders::NewOrderItem;
use seth_traders_storefront::models::Order;

use seth_traders_integration_tests::{seed_product, seed_user};

const GATEWAY_REF: &str = "order_9A33XWu170gUtm";
const PAYMENT_REF: &str = "pay_29QQoUBi66xm2f";

async fn seed_order(pool: &PgPool) -> Order {
    let user = seed_user(pool, "buyer@example.com").await;
    let price = Decimal::new(49_900, 2);
    let product_id = seed_product(pool, price).await;

    OrderRepository::new(pool)
        .create_with_items(
            user.id,
            price,
            GATEWAY_REF,
            &[NewOrderItem {
                product_id,
                quantity: 1,
                price_at_order: price,
            }],
        )
        .await
        .expect("create order")
}

async fn reload(pool: &PgPool, order: &Order) -> Order {
    OrderRepository::new(pool)
        .find_latest_for_user(GATEWAY_REF, order.user_id)
        .await
        .expect("query order")
        .expect("order exists")
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn callback_then_webhook_settles_at_captured(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let order = seed_order(&pool).await;

    assert!(
        repo.mark_authorized_if_pending(order.id, PAYMENT_REF, "sig")
            .await
            .expect("callback update")
    );
    assert!(
        repo.capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("webhook update")
    );

    let settled = reload(&pool, &order).await;
    assert_eq!(settled.payment_status, PaymentStatus::Captured);
    assert_eq!(settled.status, OrderStatus::Processing);
    assert_eq!(settled.razorpay_payment_id.as_deref(), Some(PAYMENT_REF));
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn webhook_then_callback_is_a_noop(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let order = seed_order(&pool).await;

    assert!(
        repo.capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("webhook update")
    );
    // The pending guard matches no row once the webhook has settled.
    assert!(
        !repo
            .mark_authorized_if_pending(order.id, PAYMENT_REF, "sig")
            .await
            .expect("callback update")
    );

    let settled = reload(&pool, &order).await;
    assert_eq!(settled.payment_status, PaymentStatus::Captured);
    assert_eq!(settled.status, OrderStatus::Processing);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn duplicate_capture_webhook_is_idempotent(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let _order = seed_order(&pool).await;

    assert!(
        repo.capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("first delivery")
    );
    assert!(
        !repo
            .capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("redelivery")
    );
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn failure_webhook_cannot_override_captured(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let order = seed_order(&pool).await;

    assert!(
        repo.capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("capture")
    );
    assert!(
        !repo
            .fail_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("late failure")
    );

    let settled = reload(&pool, &order).await;
    assert_eq!(settled.payment_status, PaymentStatus::Captured);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn capture_recovers_a_callback_rejected_order(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let order = seed_order(&pool).await;

    // A bad callback signature fails the order first.
    assert!(
        repo.mark_failed_if_pending(order.id, PAYMENT_REF, "bad-sig")
            .await
            .expect("callback rejection")
    );
    let rejected = reload(&pool, &order).await;
    assert_eq!(rejected.payment_status, PaymentStatus::Failed);
    assert_eq!(rejected.status, OrderStatus::Cancelled);

    // The webhook is authoritative; capture still lands.
    assert!(
        repo.capture_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("capture")
    );
    let settled = reload(&pool, &order).await;
    assert_eq!(settled.payment_status, PaymentStatus::Captured);
    assert_eq!(settled.status, OrderStatus::Processing);
}

#[sqlx::test(migrations = "../storefront/migrations")]
async fn callback_cannot_resurrect_a_failed_order(pool: PgPool) {
    let repo = OrderRepository::new(&pool);
    let order = seed_order(&pool).await;

    assert!(
        repo.fail_by_gateway_ref(GATEWAY_REF, PAYMENT_REF)
            .await
            .expect("failure webhook")
    );
    assert!(
        !repo
            .mark_authorized_if_pending(order.id, PAYMENT_REF, "sig")
            .await
            .expect("late callback")
    );

    let settled = reload(&pool, &order).await;
    assert_eq!(settled.payment_status, PaymentStatus::Failed);
    assert_eq!(settled.status, OrderStatus::Cancelled);
}
