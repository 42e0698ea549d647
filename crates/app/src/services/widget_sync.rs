//! Widget settings: validation and the storefront metafield.
//!
//! The storefront script reads `share_cart.widget_settings` from the shop
//! metafields, so every change to the widget or its linked coupon is pushed
//! there. Sync failures never fail the request that triggered them.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, instrument, warn};

use share_cart_core::ShopDomain;

use super::ValidationError;
use super::billing::{current_subscription, ensure_fits};
use crate::db::{CouponRepository, WidgetRepository};
use crate::error::AppError;
use crate::models::{Coupon, SaveWidgetRequest, Widget, WidgetWithCoupon};
use crate::shopify::AdminClient;
use crate::state::AppState;

/// Check the placements of a widget save request.
///
/// # Errors
///
/// Returns `NoPlacements` for an empty list and `DuplicatePlacement` when a
/// placement repeats.
pub fn validate_placements(request: &SaveWidgetRequest) -> Result<(), ValidationError> {
    if request.display.is_empty() {
        return Err(ValidationError::NoPlacements);
    }
    let mut seen = HashSet::new();
    for placement in &request.display {
        if !seen.insert(*placement) {
            return Err(ValidationError::DuplicatePlacement(placement.to_string()));
        }
    }
    Ok(())
}

/// Value written to the `widget_settings` metafield.
#[must_use]
pub fn metafield_value(widget: &Widget, coupon: Option<&Coupon>) -> serde_json::Value {
    json!({
        "display": widget.display,
        "button_style": widget.button_style,
        "text": widget.text,
        "colors": widget.colors,
        "coupon": coupon,
    })
}

/// Load a shop's widget with its linked coupon.
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn load(
    state: &AppState,
    shop: &ShopDomain,
) -> Result<Option<WidgetWithCoupon>, AppError> {
    let pool = state.pool();
    let Some(widget) = WidgetRepository::new(pool).get(shop).await? else {
        return Ok(None);
    };

    let coupon = match widget.coupon_id {
        Some(id) => CouponRepository::new(pool).get(shop, id).await?,
        None => None,
    };

    Ok(Some(WidgetWithCoupon { widget, coupon }))
}

/// Save the widget settings after checking them against the plan.
///
/// # Errors
///
/// Returns 400 for invalid placements, 403 when the plan does not allow
/// that many placements, 500 if the database fails.
#[instrument(skip(state, admin, request), fields(shop = %shop))]
pub async fn save(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    request: &SaveWidgetRequest,
) -> Result<WidgetWithCoupon, AppError> {
    validate_placements(request)?;

    let current = current_subscription(state.pool(), shop, Utc::now()).await?;
    ensure_fits(
        current.plan.permissions.widget,
        request.display.len() as u64,
        "widget placements",
        &current.plan.name,
    )?;

    WidgetRepository::new(state.pool()).upsert(shop, request).await?;
    sync_best_effort(state, shop, admin).await;

    load(state, shop)
        .await?
        .ok_or_else(|| AppError::Internal("widget missing after save".to_string()))
}

async fn shop_gid(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
) -> Result<String, AppError> {
    if let Some(gid) = state.shop_gids().get(shop).await {
        return Ok(gid);
    }
    let gid = admin.shop_id().await?;
    state.shop_gids().insert(shop.clone(), gid.clone()).await;
    Ok(gid)
}

/// Push the current widget settings to the shop metafield.
///
/// Does nothing when the shop has not saved a widget yet.
///
/// # Errors
///
/// Returns an error if loading the widget or any Shopify call fails.
pub async fn sync(state: &AppState, shop: &ShopDomain, admin: &AdminClient) -> Result<(), AppError> {
    let Some(current) = load(state, shop).await? else {
        debug!(shop = %shop, "No widget to sync");
        return Ok(());
    };

    let gid = shop_gid(state, shop, admin).await?;
    let value = metafield_value(&current.widget, current.coupon.as_ref());
    admin.set_widget_metafield(&gid, &value).await?;
    Ok(())
}

/// [`sync`], logging instead of failing.
pub async fn sync_best_effort(state: &AppState, shop: &ShopDomain, admin: &AdminClient) {
    if let Err(e) = sync(state, shop, admin).await {
        warn!(shop = %shop, error = %e, "Failed to sync widget metafield");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use share_cart_core::{ButtonStyle, WidgetColors, WidgetPlacement};

    use super::*;

    fn request(display: Vec<WidgetPlacement>) -> SaveWidgetRequest {
        SaveWidgetRequest {
            display,
            button_style: ButtonStyle::default(),
            text: "Share your cart".to_string(),
            colors: WidgetColors::default(),
        }
    }

    #[test]
    fn test_validate_placements() {
        assert!(validate_placements(&request(vec![WidgetPlacement::AddToCart])).is_ok());
        assert_eq!(
            validate_placements(&request(vec![])),
            Err(ValidationError::NoPlacements)
        );
        assert_eq!(
            validate_placements(&request(vec![
                WidgetPlacement::Checkout,
                WidgetPlacement::Checkout
            ])),
            Err(ValidationError::DuplicatePlacement("checkout".to_string()))
        );
    }

    #[test]
    fn test_metafield_value_without_coupon() {
        let widget = Widget {
            shop: ShopDomain::parse("demo.myshopify.com").unwrap(),
            display: vec![WidgetPlacement::AddToCart, WidgetPlacement::CartPage],
            button_style: ButtonStyle::LogoCustom,
            text: "Share".to_string(),
            colors: WidgetColors::default(),
            coupon_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = metafield_value(&widget, None);
        assert_eq!(value["display"], json!(["add_to_cart", "cart_page"]));
        assert_eq!(value["button_style"], "logo_custom");
        assert_eq!(value["colors"]["buttonText"], "#fff");
        assert!(value["coupon"].is_null());
    }
}
