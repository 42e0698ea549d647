//! Integration tests for order webhook reconciliation planning.
//!
//! Covers payload parsing and buyer classification. Recording usages
//! against the database is covered in `database.rs`.

use rust_decimal::Decimal;
use share_cart_app::db::analytics::ShareEmailMatch;
use share_cart_app::services::reconcile::{GUEST_NAME, IdValue, OrderPayload, classify};
use share_cart_core::UserType;

// A trimmed `orders/create` payload as Shopify delivers it
const ORDER_WEBHOOK: &str = r#"{
    "id": 820982911946154508,
    "email": "jon@example.com",
    "total_price": "118.50",
    "total_discounts": "11.50",
    "discount_codes": [
        {"code": "sum1234", "amount": "11.50", "type": "percentage"},
        {"code": "SUM1234", "amount": "11.50", "type": "percentage"},
        {"code": "WELCOME", "amount": "0.00", "type": "fixed_amount"}
    ],
    "customer": {
        "id": 115310627314723954,
        "email": "jon@example.com",
        "first_name": "Jon",
        "last_name": "Snow",
        "orders_count": 1
    },
    "line_items": []
}"#;

fn order() -> OrderPayload {
    OrderPayload::from_slice(ORDER_WEBHOOK.as_bytes()).expect("order payload should parse")
}

// =============================================================================
// Payload Tests
// =============================================================================

#[test]
fn test_order_payload_fields() {
    let order = order();
    assert_eq!(order.id, IdValue::Number(820_982_911_946_154_508));
    assert_eq!(order.id.to_string(), "820982911946154508");
    assert_eq!(order.total_price, Some(Decimal::new(11850, 2)));
    assert_eq!(order.buyer_email(), Some("jon@example.com"));
    assert_eq!(order.customer_name(), "Jon Snow");
}

#[test]
fn test_order_codes_deduplicated_case_insensitively() {
    let order = order();
    let codes: Vec<&str> = order
        .distinct_codes()
        .into_iter()
        .map(|line| line.code.as_str())
        .collect();
    assert_eq!(codes, vec!["sum1234", "WELCOME"]);
}

#[test]
fn test_guest_order() {
    let order = OrderPayload::from_slice(br#"{"id": "gid://shopify/Order/1", "discount_codes": []}"#)
        .expect("guest order should parse");
    assert_eq!(order.customer_name(), GUEST_NAME);
    assert_eq!(order.buyer_email(), None);
    assert!(order.distinct_codes().is_empty());
}

#[test]
fn test_order_without_id_rejected() {
    assert!(OrderPayload::from_slice(br#"{"email": "jon@example.com"}"#).is_err());
}

// =============================================================================
// Classification Tests
// =============================================================================

#[test]
fn test_classify_prefers_share_emails() {
    let order = order();
    let customer = order.customer.as_ref();

    let sender = ShareEmailMatch {
        as_sender: true,
        as_recipient: true,
    };
    assert_eq!(classify(sender, customer), UserType::Sender);

    let recipient = ShareEmailMatch {
        as_sender: false,
        as_recipient: true,
    };
    assert_eq!(classify(recipient, customer), UserType::Recipient);
}

#[test]
fn test_classify_falls_back_to_order_history() {
    let first_order = order();
    assert_eq!(
        classify(ShareEmailMatch::default(), first_order.customer.as_ref()),
        UserType::Recipient
    );

    let returning = OrderPayload::from_slice(
        br#"{"id": 2, "customer": {"id": 7, "orders_count": 12}}"#,
    )
    .expect("order should parse");
    assert_eq!(
        classify(ShareEmailMatch::default(), returning.customer.as_ref()),
        UserType::Sender
    );

    assert_eq!(classify(ShareEmailMatch::default(), None), UserType::Sender);
}
