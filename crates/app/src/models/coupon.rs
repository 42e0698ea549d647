//! Coupon domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use share_cart_core::{CouponId, DiscountKind, ShopDomain};

/// A merchant coupon mirrored to a Shopify discount code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    pub shop: ShopDomain,
    pub name: String,
    /// Customer-facing discount code (upper-case).
    pub code: String,
    pub discount_type: DiscountKind,
    /// Fraction in `(0, 1]` when `discount_type` is percentage.
    pub percentage_value: Option<Decimal>,
    pub fixed_amount: Option<Decimal>,

    pub sender_require_min_purchase: bool,
    pub sender_min_purchase_amount: Option<Decimal>,
    pub sender_times_per_user: bool,
    pub sender_times_value: Option<i32>,
    pub sender_new_customers_only: bool,

    pub recipient_require_min_purchase: bool,
    pub recipient_min_purchase_amount: Option<Decimal>,
    pub recipient_times_per_user: bool,
    pub recipient_times_value: Option<i32>,
    pub recipient_new_customers_only: bool,

    pub share_whatsapp: bool,
    pub share_messenger: bool,
    pub share_email: bool,

    /// Product picked in the admin UI as the coupon's headline product.
    pub product_id: Option<String>,
    pub product_type: Option<String>,
    /// Shopify product GIDs the discount applies to.
    pub product_ids: Vec<String>,
    /// Shopify collection GIDs the discount applies to.
    pub collection_ids: Vec<String>,
    /// `DiscountCodeNode` GID, absent only for coupons whose Shopify mirror failed.
    pub shopify_discount_id: Option<String>,
    pub custom_message: Option<String>,

    pub sent_count: i32,
    pub converted_count: i32,
    pub click_count: i32,
    pub revenue: Decimal,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shown in the coupon list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub id: CouponId,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub sent_count: i32,
    pub converted_count: i32,
    /// Names of customers who redeemed the coupon, comma separated.
    pub used_by: String,
    pub is_active: bool,
}

/// Request body for creating a coupon.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub name: String,
    #[serde(default)]
    pub discount_type: DiscountKind,
    pub percentage_value: Option<Decimal>,
    pub fixed_amount: Option<Decimal>,

    #[serde(default)]
    pub sender_require_min_purchase: bool,
    pub sender_min_purchase_amount: Option<Decimal>,
    #[serde(default)]
    pub sender_times_per_user: bool,
    pub sender_times_value: Option<i32>,
    #[serde(default)]
    pub sender_new_customers_only: bool,

    #[serde(default)]
    pub recipient_require_min_purchase: bool,
    pub recipient_min_purchase_amount: Option<Decimal>,
    #[serde(default)]
    pub recipient_times_per_user: bool,
    pub recipient_times_value: Option<i32>,
    #[serde(default)]
    pub recipient_new_customers_only: bool,

    pub share_whatsapp: Option<bool>,
    pub share_messenger: Option<bool>,
    pub share_email: Option<bool>,

    pub product_id: Option<String>,
    pub product_type: Option<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub custom_message: Option<String>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

/// Request body for a partial coupon update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponRequest {
    pub name: Option<String>,
    pub discount_type: Option<DiscountKind>,
    pub percentage_value: Option<Decimal>,
    pub fixed_amount: Option<Decimal>,

    pub sender_require_min_purchase: Option<bool>,
    pub sender_min_purchase_amount: Option<Decimal>,
    pub sender_times_per_user: Option<bool>,
    pub sender_times_value: Option<i32>,
    pub sender_new_customers_only: Option<bool>,

    pub recipient_require_min_purchase: Option<bool>,
    pub recipient_min_purchase_amount: Option<Decimal>,
    pub recipient_times_per_user: Option<bool>,
    pub recipient_times_value: Option<i32>,
    pub recipient_new_customers_only: Option<bool>,

    pub share_whatsapp: Option<bool>,
    pub share_messenger: Option<bool>,
    pub share_email: Option<bool>,

    pub product_id: Option<String>,
    pub product_type: Option<String>,
    pub product_ids: Option<Vec<String>>,
    pub collection_ids: Option<Vec<String>>,
    pub custom_message: Option<String>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// Validated values for inserting a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub shop: ShopDomain,
    pub name: String,
    pub code: String,
    pub discount_type: DiscountKind,
    pub percentage_value: Option<Decimal>,
    pub fixed_amount: Option<Decimal>,
    pub sender_require_min_purchase: bool,
    pub sender_min_purchase_amount: Option<Decimal>,
    pub sender_times_per_user: bool,
    pub sender_times_value: Option<i32>,
    pub sender_new_customers_only: bool,
    pub recipient_require_min_purchase: bool,
    pub recipient_min_purchase_amount: Option<Decimal>,
    pub recipient_times_per_user: bool,
    pub recipient_times_value: Option<i32>,
    pub recipient_new_customers_only: bool,
    pub share_whatsapp: bool,
    pub share_messenger: bool,
    pub share_email: bool,
    pub product_id: Option<String>,
    pub product_type: Option<String>,
    pub product_ids: Vec<String>,
    pub collection_ids: Vec<String>,
    pub shopify_discount_id: Option<String>,
    pub custom_message: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Coupon {
    /// Applies a partial update in memory, leaving activation untouched.
    pub fn apply(&mut self, patch: &UpdateCouponRequest) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field {
                    self.$field = v.clone();
                })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &patch.$field {
                    self.$field = Some(v.clone());
                })*
            };
        }

        set!(
            name,
            discount_type,
            sender_require_min_purchase,
            sender_times_per_user,
            sender_new_customers_only,
            recipient_require_min_purchase,
            recipient_times_per_user,
            recipient_new_customers_only,
            share_whatsapp,
            share_messenger,
            share_email,
            product_ids,
            collection_ids,
            start_date,
            end_date,
        );
        set_opt!(
            percentage_value,
            fixed_amount,
            sender_min_purchase_amount,
            sender_times_value,
            recipient_min_purchase_amount,
            recipient_times_value,
            product_id,
            product_type,
            custom_message,
        );
    }

    /// Minimum subtotal enforced on Shopify, taken from the sender rules.
    #[must_use]
    pub fn minimum_subtotal(&self) -> Option<Decimal> {
        if self.sender_require_min_purchase {
            self.sender_min_purchase_amount
        } else {
            None
        }
    }
}

impl NewCoupon {
    #[must_use]
    pub fn minimum_subtotal(&self) -> Option<Decimal> {
        if self.sender_require_min_purchase {
            self.sender_min_purchase_amount
        } else {
            None
        }
    }
}
