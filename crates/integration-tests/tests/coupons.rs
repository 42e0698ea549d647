//! Integration tests for coupon validation.
//!
//! Requests are built from the JSON the embedded admin sends.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use share_cart_app::models::CreateCouponRequest;
use share_cart_app::services::ValidationError;
use share_cart_app::services::coupons::{generate_code, normalize_percentage, validate_new};
use share_cart_core::{DiscountKind, ShopDomain};

fn shop() -> ShopDomain {
    ShopDomain::parse("demo.myshopify.com").expect("valid shop")
}

fn request(body: serde_json::Value) -> CreateCouponRequest {
    serde_json::from_value(body).expect("request should deserialize")
}

fn base_request() -> serde_json::Value {
    serde_json::json!({
        "name": "Summer Share",
        "discountType": "percentage",
        "percentageValue": "15",
        "productIds": ["8123456789"],
        "collectionIds": [],
        "senderRequireMinPurchase": true,
        "senderMinPurchaseAmount": "50.00"
    })
}

// =============================================================================
// Create Validation Tests
// =============================================================================

#[test]
fn test_validate_new_coupon() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let coupon = validate_new(&shop(), &request(base_request()), "SUM1234".to_string(), now)
        .expect("request should validate");

    assert_eq!(coupon.name, "Summer Share");
    assert_eq!(coupon.discount_type, DiscountKind::Percentage);
    assert_eq!(coupon.percentage_value, Some(Decimal::new(15, 2)));
    assert_eq!(coupon.product_ids, vec!["gid://shopify/Product/8123456789"]);
    assert_eq!(coupon.start_date, now);
    assert_eq!(coupon.end_date, now + Duration::days(30));
    assert!(coupon.share_whatsapp && coupon.share_messenger && coupon.share_email);
}

#[test]
fn test_validate_new_requires_targets() {
    let mut body = base_request();
    body["productIds"] = serde_json::json!([]);
    let err = validate_new(&shop(), &request(body), "SUM1234".to_string(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::NoDiscountTargets);
}

#[test]
fn test_validate_new_fixed_amount_must_be_positive() {
    let mut body = base_request();
    body["discountType"] = serde_json::json!("fixed");
    body["fixedAmount"] = serde_json::json!("0");
    let err = validate_new(&shop(), &request(body), "SUM1234".to_string(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::InvalidFixedAmount);
}

#[test]
fn test_validate_new_min_purchase_must_be_positive() {
    let mut body = base_request();
    body["senderMinPurchaseAmount"] = serde_json::json!("-5");
    let err = validate_new(&shop(), &request(body), "SUM1234".to_string(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::InvalidMinimumPurchase);
}

#[test]
fn test_validate_new_rejects_inverted_dates() {
    let mut body = base_request();
    body["startDate"] = serde_json::json!("2025-06-10T00:00:00Z");
    body["endDate"] = serde_json::json!("2025-06-01T00:00:00Z");
    let err = validate_new(&shop(), &request(body), "SUM1234".to_string(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::EndBeforeStart);
}

// =============================================================================
// Value Helpers
// =============================================================================

#[test]
fn test_normalize_percentage() {
    assert_eq!(normalize_percentage(Decimal::new(25, 0)), Ok(Decimal::new(25, 2)));
    assert_eq!(normalize_percentage(Decimal::new(5, 1)), Ok(Decimal::new(5, 1)));
    assert_eq!(normalize_percentage(Decimal::ONE), Ok(Decimal::ONE));
    assert_eq!(
        normalize_percentage(Decimal::ZERO),
        Err(ValidationError::PercentageOutOfRange)
    );
    assert_eq!(
        normalize_percentage(Decimal::new(150, 0)),
        Err(ValidationError::PercentageOutOfRange)
    );
}

#[test]
fn test_generate_code() {
    assert_eq!(generate_code("Summer Share", 1234), "SUM1234");
    assert_eq!(generate_code(" b f", 1000), "BF1000");
}
