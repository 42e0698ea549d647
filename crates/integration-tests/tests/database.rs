//! Database-backed tests for coupon activation and order recording.
//!
//! These need a PostgreSQL server. Point `DATABASE_URL` at a scratch
//! database and run:
//!
//! ```bash
//! cargo test -p share-cart-integration-tests --test database -- --ignored
//! ```
//!
//! Migrations run before each test. Every test works in its own shop so
//! they can share a database and run in parallel.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;

use share_cart_app::db::{self, AnalyticsRepository, CouponRepository};
use share_cart_app::models::{Coupon, NewCoupon, NewCouponUsage};
use share_cart_app::services::reconcile::{OrderPayload, ReconcileOutcome, reconcile_order};
use share_cart_core::{DiscountKind, ShopDomain, UserType};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../app/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A shop domain no other test run has used.
fn fresh_shop(label: &str) -> ShopDomain {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    ShopDomain::parse(&format!("it-{label}-{nanos}.myshopify.com")).expect("valid shop domain")
}

fn decimal(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal")
}

fn new_coupon(shop: &ShopDomain, code: &str) -> NewCoupon {
    let now = Utc::now();
    NewCoupon {
        shop: shop.clone(),
        name: format!("Coupon {code}"),
        code: code.to_string(),
        discount_type: DiscountKind::Percentage,
        percentage_value: Some(decimal("0.10")),
        fixed_amount: None,
        sender_require_min_purchase: false,
        sender_min_purchase_amount: None,
        sender_times_per_user: false,
        sender_times_value: None,
        sender_new_customers_only: false,
        recipient_require_min_purchase: false,
        recipient_min_purchase_amount: None,
        recipient_times_per_user: false,
        recipient_times_value: None,
        recipient_new_customers_only: false,
        share_whatsapp: true,
        share_messenger: true,
        share_email: true,
        product_id: None,
        product_type: None,
        product_ids: Vec::new(),
        collection_ids: Vec::new(),
        shopify_discount_id: None,
        custom_message: None,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
    }
}

async fn insert_coupon(pool: &PgPool, shop: &ShopDomain, code: &str) -> Coupon {
    CouponRepository::new(pool)
        .insert(&new_coupon(shop, code))
        .await
        .expect("Failed to insert coupon")
}

async fn reload(pool: &PgPool, coupon: &Coupon) -> Coupon {
    CouponRepository::new(pool)
        .get(&coupon.shop, coupon.id)
        .await
        .expect("Failed to load coupon")
        .expect("coupon should exist")
}

fn order_webhook(order_id: i64, code: &str, total: &str, orders_count: u64) -> OrderPayload {
    let body = json!({
        "id": order_id,
        "email": "buyer@example.com",
        "total_price": total,
        "total_discounts": "5.00",
        "discount_codes": [{ "code": code, "amount": "5.00", "type": "percentage" }],
        "customer": {
            "id": 4242,
            "first_name": "Ada",
            "last_name": "Buyer",
            "orders_count": orders_count
        },
        "line_items": []
    });
    OrderPayload::from_slice(body.to_string().as_bytes()).expect("order payload should parse")
}

// =============================================================================
// Activation Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_activation_leaves_one_active_coupon() {
    let pool = pool().await;
    let shop = fresh_shop("activate");
    let coupons = CouponRepository::new(&pool);

    let first = insert_coupon(&pool, &shop, "FIRST01").await;
    let second = insert_coupon(&pool, &shop, "SECOND2").await;

    let activation = coupons
        .activate(&shop, first.id)
        .await
        .expect("Failed to activate first coupon")
        .expect("first coupon should exist");
    assert!(activation.activated.is_active);
    assert!(activation.deactivated.is_empty());
    assert_eq!(coupons.count_active(&shop).await.expect("count"), 1);

    let activation = coupons
        .activate(&shop, second.id)
        .await
        .expect("Failed to activate second coupon")
        .expect("second coupon should exist");
    assert_eq!(activation.activated.id, second.id);
    let deactivated: Vec<_> = activation.deactivated.iter().map(|c| c.id).collect();
    assert_eq!(deactivated, vec![first.id]);

    assert_eq!(coupons.count_active(&shop).await.expect("count"), 1);
    assert!(!reload(&pool, &first).await.is_active);
    assert!(reload(&pool, &second).await.is_active);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_concurrent_activations_keep_one_active() {
    let pool = pool().await;
    let shop = fresh_shop("race");

    let first = insert_coupon(&pool, &shop, "RACE001").await;
    let second = insert_coupon(&pool, &shop, "RACE002").await;

    let repo_a = CouponRepository::new(&pool);
    let repo_b = CouponRepository::new(&pool);
    let (a, b) = tokio::join!(
        repo_a.activate(&shop, first.id),
        repo_b.activate(&shop, second.id)
    );
    // One side may lose the unique index race; the survivor must be alone
    assert!(a.is_ok() || b.is_ok());

    let active = CouponRepository::new(&pool)
        .count_active(&shop)
        .await
        .expect("count");
    assert_eq!(active, 1);
}

// =============================================================================
// Order Recording Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_redelivered_webhook_is_counted_once() {
    let pool = pool().await;
    let shop = fresh_shop("redeliver");
    let coupon = insert_coupon(&pool, &shop, "REDO123").await;
    let order = order_webhook(9001, "redo123", "80.00", 3);

    let first = reconcile_order(&pool, &shop, &order).await.expect("reconcile");
    assert_eq!(first, ReconcileOutcome::Recorded(1));

    let again = reconcile_order(&pool, &shop, &order).await.expect("reconcile");
    assert_eq!(again, ReconcileOutcome::AlreadyProcessed);

    let coupon = reload(&pool, &coupon).await;
    assert_eq!(coupon.converted_count, 1);
    assert_eq!(coupon.revenue, decimal("80.00"));

    let usages = AnalyticsRepository::new(&pool)
        .usages_between(&shop, None, None)
        .await
        .expect("usages");
    assert_eq!(usages.len(), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_create_then_fulfilled_is_counted_once() {
    let pool = pool().await;
    let shop = fresh_shop("fulfil");
    let coupon = insert_coupon(&pool, &shop, "SHIP123").await;

    // orders/create and orders/fulfilled carry the same order id
    let created = order_webhook(9100, "SHIP123", "64.00", 2);
    let fulfilled = order_webhook(9100, "ship123", "64.00", 2);

    assert_eq!(
        reconcile_order(&pool, &shop, &created).await.expect("reconcile"),
        ReconcileOutcome::Recorded(1)
    );
    assert_eq!(
        reconcile_order(&pool, &shop, &fulfilled).await.expect("reconcile"),
        ReconcileOutcome::AlreadyProcessed
    );

    let coupon = reload(&pool, &coupon).await;
    assert_eq!(coupon.converted_count, 1);
    assert_eq!(coupon.revenue, decimal("64.00"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_signed_webhook_replaces_storefront_report() {
    let pool = pool().await;
    let shop = fresh_shop("report");
    let coupon = insert_coupon(&pool, &shop, "SHOP555").await;
    let analytics = AnalyticsRepository::new(&pool);

    // The storefront reports the order first, with values it made up
    let report = NewCouponUsage {
        shop: shop.clone(),
        coupon_id: Some(coupon.id),
        coupon_name: coupon.name.clone(),
        coupon_code: coupon.code.clone(),
        user_type: UserType::Sender,
        order_id: Some("555".to_string()),
        order_value: decimal("0.01"),
        discount_amount: Decimal::ZERO,
        customer_id: None,
        customer_name: None,
        customer_email: None,
    };
    assert!(analytics.record_usage(&report).await.expect("record usage"));
    assert_eq!(reload(&pool, &coupon).await.converted_count, 0);

    let order = order_webhook(555, "SHOP555", "200.00", 1);
    assert_eq!(
        reconcile_order(&pool, &shop, &order).await.expect("reconcile"),
        ReconcileOutcome::Recorded(1)
    );

    let reloaded = reload(&pool, &coupon).await;
    assert_eq!(reloaded.converted_count, 1);
    assert_eq!(reloaded.revenue, decimal("200.00"));

    let usages = analytics
        .usages_between(&shop, None, None)
        .await
        .expect("usages");
    assert_eq!(usages.len(), 1);
    let usage = usages.first().expect("one usage");
    assert!(usage.verified);
    assert_eq!(usage.order_id.as_deref(), Some("555"));
    assert_eq!(usage.order_value, decimal("200.00"));
    assert_eq!(usage.user_type, UserType::Recipient);

    // A late storefront report for the same order is dropped
    assert!(!analytics.record_usage(&report).await.expect("record usage"));
    let usages = analytics
        .usages_between(&shop, None, None)
        .await
        .expect("usages");
    assert_eq!(usages.len(), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_duplicate_storefront_reports_are_dropped() {
    let pool = pool().await;
    let shop = fresh_shop("dupe");
    let coupon = insert_coupon(&pool, &shop, "DUPE123").await;
    let analytics = AnalyticsRepository::new(&pool);

    let report = NewCouponUsage {
        shop: shop.clone(),
        coupon_id: Some(coupon.id),
        coupon_name: coupon.name.clone(),
        coupon_code: coupon.code.clone(),
        user_type: UserType::Recipient,
        order_id: Some("777".to_string()),
        order_value: decimal("30.00"),
        discount_amount: decimal("3.00"),
        customer_id: None,
        customer_name: None,
        customer_email: None,
    };
    assert!(analytics.record_usage(&report).await.expect("record usage"));
    assert!(!analytics.record_usage(&report).await.expect("record usage"));

    let usages = analytics
        .usages_between(&shop, None, None)
        .await
        .expect("usages");
    assert_eq!(usages.len(), 1);
    assert!(!usages.first().expect("one usage").verified);
    assert_eq!(reload(&pool, &coupon).await.converted_count, 0);
}
