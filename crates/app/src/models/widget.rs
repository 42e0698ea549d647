//! Widget configuration models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use share_cart_core::{ButtonStyle, CouponId, ShopDomain, WidgetColors, WidgetPlacement};

use super::Coupon;

/// Storefront widget settings, one per shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub shop: ShopDomain,
    pub display: Vec<WidgetPlacement>,
    pub button_style: ButtonStyle,
    pub text: String,
    pub colors: WidgetColors,
    pub coupon_id: Option<CouponId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Widget with its linked coupon resolved, as returned to the admin UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetWithCoupon {
    #[serde(flatten)]
    pub widget: Widget,
    pub coupon: Option<Coupon>,
}

/// Request body for saving widget settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWidgetRequest {
    #[serde(default = "default_display")]
    pub display: Vec<WidgetPlacement>,
    #[serde(default)]
    pub button_style: ButtonStyle,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub colors: WidgetColors,
}

fn default_display() -> Vec<WidgetPlacement> {
    vec![WidgetPlacement::AddToCart]
}
