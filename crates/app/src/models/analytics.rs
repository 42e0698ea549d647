//! Share and redemption event models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use share_cart_core::{CouponId, CouponUsageId, ShareEventId, SharePlatform, ShopDomain, UserType};

/// A cart share from the storefront widget. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEvent {
    pub id: ShareEventId,
    pub shop: ShopDomain,
    pub platform: SharePlatform,
    pub coupon_id: Option<CouponId>,
    pub coupon_code: Option<String>,
    pub cart_value: Option<Decimal>,
    pub customer_id: Option<String>,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
    /// Raw user agent of the sharing browser.
    pub device_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A redemption of a coupon, from checkout or from an order webhook.
///
/// Storefront reports stay unverified until the order webhook replaces them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsage {
    pub id: CouponUsageId,
    pub shop: ShopDomain,
    pub coupon_id: Option<CouponId>,
    pub coupon_name: String,
    pub coupon_code: String,
    pub user_type: UserType,
    pub order_id: Option<String>,
    pub order_value: Decimal,
    pub discount_amount: Decimal,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Values for appending a share event.
#[derive(Debug, Clone)]
pub struct NewShareEvent {
    pub shop: ShopDomain,
    pub platform: SharePlatform,
    pub coupon_id: Option<CouponId>,
    pub coupon_code: Option<String>,
    pub cart_value: Option<Decimal>,
    pub customer_id: Option<String>,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
    pub device_type: Option<String>,
}

/// Values for appending a coupon usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCouponUsage {
    pub shop: ShopDomain,
    pub coupon_id: Option<CouponId>,
    pub coupon_name: String,
    pub coupon_code: String,
    pub user_type: UserType,
    pub order_id: Option<String>,
    pub order_value: Decimal,
    pub discount_amount: Decimal,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// One line of the coupon activity feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponActivity {
    pub coupon_name: String,
    pub coupon_code: String,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub status: &'static str,
    pub order_value: Decimal,
    pub discount_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<CouponUsage> for CouponActivity {
    fn from(usage: CouponUsage) -> Self {
        let (sender, receiver) = match usage.user_type {
            UserType::Sender => (usage.customer_name, None),
            UserType::Recipient => (None, usage.customer_name),
        };

        Self {
            coupon_name: usage.coupon_name,
            coupon_code: usage.coupon_code,
            sender,
            receiver,
            status: if usage.verified { "converted" } else { "reported" },
            order_value: usage.order_value,
            discount_amount: usage.discount_amount,
            timestamp: usage.created_at,
        }
    }
}
