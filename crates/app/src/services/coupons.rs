//! Coupon lifecycle: validation, Shopify mirroring and activation.
//!
//! Writes go to Shopify first and to the database second. A Shopify
//! discount whose local insert fails is deleted again.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use share_cart_core::{CouponId, DiscountKind, ShopDomain};

use super::ValidationError;
use super::billing::{current_subscription, ensure_fits, ensure_room};
use super::widget_sync;
use crate::db::{CouponRepository, WidgetRepository};
use crate::error::AppError;
use crate::models::{Coupon, CreateCouponRequest, NewCoupon, UpdateCouponRequest};
use crate::shopify::{AdminClient, DiscountMirror, DiscountScopeChange, GidKind, to_gid};
use crate::state::AppState;

/// Lifetime of a coupon created without an end date.
const DEFAULT_COUPON_DAYS: i64 = 30;

/// Decimal places of the stored percentage fraction.
const PERCENTAGE_SCALE: u32 = 4;

/// Normalize a percentage to a fraction in `(0, 1]`.
///
/// Values above 1 are read as whole percentages (`15` → `0.15`). The
/// fraction is stored with four decimal places, so `12.34%` is the finest
/// step.
///
/// # Errors
///
/// Returns `PercentageOutOfRange` if the result is not in `(0, 1]`, or
/// `PercentagePrecision` if it needs more than four decimal places.
pub fn normalize_percentage(value: Decimal) -> Result<Decimal, ValidationError> {
    let fraction = if value > Decimal::ONE {
        value / Decimal::ONE_HUNDRED
    } else {
        value
    };

    if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
        return Err(ValidationError::PercentageOutOfRange);
    }

    let fraction = fraction.normalize();
    if fraction.scale() > PERCENTAGE_SCALE {
        return Err(ValidationError::PercentagePrecision);
    }
    Ok(fraction)
}

/// Discount code from the coupon name: its first three characters
/// upper-cased followed by a four-digit number.
#[must_use]
pub fn generate_code(name: &str, number: u16) -> String {
    let prefix: String = name
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    format!("{prefix}{number}")
}

fn random_code_number() -> u16 {
    rand::rng().random_range(1000..=9999)
}

fn to_gids(kind: GidKind, ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| to_gid(kind, id))
        .collect()
}

fn check_value(
    kind: DiscountKind,
    percentage: Option<Decimal>,
    fixed_amount: Option<Decimal>,
) -> Result<(Option<Decimal>, Option<Decimal>), ValidationError> {
    match kind {
        DiscountKind::Percentage => {
            let percentage = percentage.ok_or(ValidationError::PercentageOutOfRange)?;
            Ok((Some(normalize_percentage(percentage)?), None))
        }
        DiscountKind::Fixed => match fixed_amount {
            Some(amount) if amount > Decimal::ZERO => Ok((None, Some(amount))),
            _ => Err(ValidationError::InvalidFixedAmount),
        },
    }
}

fn check_min_purchase(required: bool, amount: Option<Decimal>) -> Result<(), ValidationError> {
    match (required, amount) {
        (true, Some(amount)) if amount <= Decimal::ZERO => {
            Err(ValidationError::InvalidMinimumPurchase)
        }
        (true, None) => Err(ValidationError::InvalidMinimumPurchase),
        _ => Ok(()),
    }
}

/// Validate a create request into insertable values.
///
/// Product and collection ids are stored as global IDs.
///
/// # Errors
///
/// Returns the first `ValidationError` the request violates.
pub fn validate_new(
    shop: &ShopDomain,
    request: &CreateCouponRequest,
    code: String,
    now: DateTime<Utc>,
) -> Result<NewCoupon, ValidationError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }

    let product_ids = to_gids(GidKind::Product, &request.product_ids);
    let collection_ids = to_gids(GidKind::Collection, &request.collection_ids);
    if product_ids.is_empty() && collection_ids.is_empty() {
        return Err(ValidationError::NoDiscountTargets);
    }

    let (percentage_value, fixed_amount) = check_value(
        request.discount_type,
        request.percentage_value,
        request.fixed_amount,
    )?;
    check_min_purchase(
        request.sender_require_min_purchase,
        request.sender_min_purchase_amount,
    )?;
    check_min_purchase(
        request.recipient_require_min_purchase,
        request.recipient_min_purchase_amount,
    )?;

    let start_date = request.start_date.unwrap_or(now);
    let end_date = request
        .end_date
        .unwrap_or_else(|| start_date + Duration::days(DEFAULT_COUPON_DAYS));
    if end_date <= start_date {
        return Err(ValidationError::EndBeforeStart);
    }

    Ok(NewCoupon {
        shop: shop.clone(),
        name: name.to_string(),
        code,
        discount_type: request.discount_type,
        percentage_value,
        fixed_amount,
        sender_require_min_purchase: request.sender_require_min_purchase,
        sender_min_purchase_amount: request.sender_min_purchase_amount,
        sender_times_per_user: request.sender_times_per_user,
        sender_times_value: request.sender_times_value,
        sender_new_customers_only: request.sender_new_customers_only,
        recipient_require_min_purchase: request.recipient_require_min_purchase,
        recipient_min_purchase_amount: request.recipient_min_purchase_amount,
        recipient_times_per_user: request.recipient_times_per_user,
        recipient_times_value: request.recipient_times_value,
        recipient_new_customers_only: request.recipient_new_customers_only,
        share_whatsapp: request.share_whatsapp.unwrap_or(true),
        share_messenger: request.share_messenger.unwrap_or(true),
        share_email: request.share_email.unwrap_or(true),
        product_id: request.product_id.clone(),
        product_type: request.product_type.clone(),
        product_ids,
        collection_ids,
        shopify_discount_id: None,
        custom_message: request.custom_message.clone(),
        start_date,
        end_date,
    })
}

/// Apply a partial update to a coupon and re-check the result.
///
/// # Errors
///
/// Returns the first `ValidationError` the updated coupon violates.
pub fn apply_update(coupon: &mut Coupon, patch: &UpdateCouponRequest) -> Result<(), ValidationError> {
    let mut patch = patch.clone();
    if let Some(ids) = &patch.product_ids {
        patch.product_ids = Some(to_gids(GidKind::Product, ids));
    }
    if let Some(ids) = &patch.collection_ids {
        patch.collection_ids = Some(to_gids(GidKind::Collection, ids));
    }
    if let Some(name) = &patch.name {
        patch.name = Some(name.trim().to_string());
    }

    coupon.apply(&patch);

    if coupon.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if coupon.product_ids.is_empty() && coupon.collection_ids.is_empty() {
        return Err(ValidationError::NoDiscountTargets);
    }
    let (percentage_value, fixed_amount) = check_value(
        coupon.discount_type,
        coupon.percentage_value,
        coupon.fixed_amount,
    )?;
    coupon.percentage_value = percentage_value;
    coupon.fixed_amount = fixed_amount;
    check_min_purchase(
        coupon.sender_require_min_purchase,
        coupon.sender_min_purchase_amount,
    )?;
    check_min_purchase(
        coupon.recipient_require_min_purchase,
        coupon.recipient_min_purchase_amount,
    )?;
    if coupon.end_date <= coupon.start_date {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

/// Create a coupon and its Shopify discount.
///
/// # Errors
///
/// Returns 403 when the plan has no room for another live coupon, 400 on
/// invalid input or Shopify `userErrors`, 500 when Shopify or the database fail.
#[instrument(skip(state, admin, request), fields(shop = %shop))]
pub async fn create(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    request: &CreateCouponRequest,
) -> Result<Coupon, AppError> {
    let now = Utc::now();
    let pool = state.pool();
    let repo = CouponRepository::new(pool);

    let active = repo.count_active(shop).await?;
    let current = current_subscription(pool, shop, now).await?;
    ensure_room(
        current.plan.permissions.live_coupons,
        active,
        "live coupons",
        &current.plan.name,
    )?;

    let code = generate_code(&request.name, random_code_number());
    let mut new_coupon = validate_new(shop, request, code, now)?;

    let scope = DiscountScopeChange::initial(&new_coupon.product_ids, &new_coupon.collection_ids);
    let discount_id = admin
        .create_discount(&DiscountMirror::from(&new_coupon), &scope)
        .await?;
    new_coupon.shopify_discount_id = Some(discount_id.clone());

    let coupon = match repo.insert(&new_coupon).await {
        Ok(coupon) => coupon,
        Err(err) => {
            if let Err(cleanup) = admin.delete_discount(&discount_id).await {
                warn!(
                    discount_id = %discount_id,
                    error = %cleanup,
                    "Failed to delete Shopify discount after local insert failed"
                );
            }
            return Err(err.into());
        }
    };

    info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");

    if request.is_active {
        return activate(state, shop, admin, coupon.id).await;
    }

    // Local coupons start inactive; keep the mirror in step.
    if let Err(e) = admin.deactivate_discount(&discount_id).await {
        warn!(coupon_id = %coupon.id, error = %e, "Failed to deactivate new Shopify discount");
    }

    Ok(coupon)
}

/// Apply a partial update to a coupon and its Shopify discount.
///
/// # Errors
///
/// Returns 404 if the coupon is not in the shop, 400 on invalid input or
/// Shopify `userErrors`, 500 when Shopify or the database fail.
#[instrument(skip(state, admin, patch), fields(shop = %shop, coupon_id = %id))]
pub async fn update(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    id: CouponId,
    patch: &UpdateCouponRequest,
) -> Result<Coupon, AppError> {
    let pool = state.pool();
    let repo = CouponRepository::new(pool);

    let current = repo
        .get(shop, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

    let mut updated = current.clone();
    apply_update(&mut updated, patch)?;

    if let Some(discount_id) = &updated.shopify_discount_id {
        let mut mirror = DiscountMirror::from(&updated);
        mirror.clear_minimum = current.minimum_subtotal().is_some();
        let scope = DiscountScopeChange::between(
            &current.product_ids,
            &current.collection_ids,
            &updated.product_ids,
            &updated.collection_ids,
        );
        admin
            .update_discount(discount_id, &mirror, &scope)
            .await?;
    }

    let saved = repo.update(&updated).await?;

    match patch.is_active {
        Some(true) if !saved.is_active => activate(state, shop, admin, id).await,
        Some(false) if saved.is_active => deactivate(state, shop, admin, id).await,
        _ => {
            if saved.is_active {
                WidgetRepository::new(pool).link_coupon(shop, saved.id).await?;
                widget_sync::sync_best_effort(state, shop, admin).await;
            }
            Ok(saved)
        }
    }
}

/// Delete a coupon locally, then its Shopify discount.
///
/// # Errors
///
/// Returns 404 if the coupon is not in the shop, 500 if the database fails.
#[instrument(skip(state, admin), fields(shop = %shop, coupon_id = %id))]
pub async fn delete(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    id: CouponId,
) -> Result<Coupon, AppError> {
    let pool = state.pool();
    let deleted = CouponRepository::new(pool)
        .delete(shop, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

    let unlinked = WidgetRepository::new(pool).unlink_coupon(shop, id).await?;
    if unlinked.is_some() {
        widget_sync::sync_best_effort(state, shop, admin).await;
    }

    if let Some(discount_id) = &deleted.shopify_discount_id
        && let Err(e) = admin.delete_discount(discount_id).await
    {
        warn!(discount_id = %discount_id, error = %e, "Failed to delete Shopify discount");
    }

    info!(code = %deleted.code, "Coupon deleted");
    Ok(deleted)
}

/// Make a coupon the shop's only active coupon.
///
/// # Errors
///
/// Returns 403 when the plan allows no live coupons or has lapsed, 404 if
/// the coupon is not in the shop, 500 if the database fails.
#[instrument(skip(state, admin), fields(shop = %shop, coupon_id = %id))]
pub async fn activate(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    id: CouponId,
) -> Result<Coupon, AppError> {
    let pool = state.pool();

    let current = current_subscription(pool, shop, Utc::now()).await?;
    ensure_fits(
        current.plan.permissions.live_coupons,
        1,
        "live coupons",
        &current.plan.name,
    )?;

    let activation = CouponRepository::new(pool)
        .activate(shop, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

    WidgetRepository::new(pool).link_coupon(shop, id).await?;
    widget_sync::sync_best_effort(state, shop, admin).await;

    for previous in &activation.deactivated {
        if let Some(discount_id) = &previous.shopify_discount_id
            && let Err(e) = admin.deactivate_discount(discount_id).await
        {
            warn!(coupon_id = %previous.id, error = %e, "Failed to deactivate Shopify discount");
        }
    }
    if let Some(discount_id) = &activation.activated.shopify_discount_id
        && let Err(e) = admin.activate_discount(discount_id).await
    {
        warn!(error = %e, "Failed to activate Shopify discount");
    }

    info!(
        deactivated = activation.deactivated.len(),
        "Coupon activated"
    );
    Ok(activation.activated)
}

/// Clear a coupon's active flag and deactivate its Shopify discount.
///
/// # Errors
///
/// Returns 404 if the coupon is not in the shop, 500 if the database fails.
#[instrument(skip(state, admin), fields(shop = %shop, coupon_id = %id))]
pub async fn deactivate(
    state: &AppState,
    shop: &ShopDomain,
    admin: &AdminClient,
    id: CouponId,
) -> Result<Coupon, AppError> {
    let pool = state.pool();
    let coupon = CouponRepository::new(pool)
        .deactivate(shop, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

    if WidgetRepository::new(pool)
        .unlink_coupon(shop, id)
        .await?
        .is_some()
    {
        widget_sync::sync_best_effort(state, shop, admin).await;
    }

    if let Some(discount_id) = &coupon.shopify_discount_id
        && let Err(e) = admin.deactivate_discount(discount_id).await
    {
        warn!(error = %e, "Failed to deactivate Shopify discount");
    }

    Ok(coupon)
}

/// Count a storefront click on a coupon link.
///
/// # Errors
///
/// Returns 404 if no coupon in the shop has the code.
pub async fn record_click(
    pool: &PgPool,
    shop: &ShopDomain,
    code: &str,
) -> Result<CouponId, AppError> {
    CouponRepository::new(pool)
        .record_click(shop, code.trim())
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound("Coupon not found".to_string())
            }
            other => other.into(),
        })
}
