//! Plan gating and subscription periods.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use share_cart_core::{Limit, PlanDuration, PlanId, ShopDomain};

use crate::db::BillingRepository;
use crate::error::AppError;
use crate::models::{PlanDefinition, SubscriptionWithPlan};

/// The shop's current subscription, or 403 if it has none or it lapsed.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when there is no subscription or it has
/// expired, `AppError::Database` if the lookup fails.
pub async fn current_subscription(
    pool: &PgPool,
    shop: &ShopDomain,
    now: DateTime<Utc>,
) -> Result<SubscriptionWithPlan, AppError> {
    let current = BillingRepository::new(pool)
        .latest_subscription(shop)
        .await?
        .ok_or_else(|| AppError::Forbidden("Subscription details not found".to_string()))?;

    if current.subscription.is_expired(now) {
        return Err(AppError::Forbidden("Subscription has expired".to_string()));
    }

    Ok(current)
}

/// Fail with 403 unless `limit` leaves room for one more item.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the limit and the plan.
pub fn ensure_room(
    limit: Limit,
    current: u64,
    what: &str,
    plan_name: &str,
) -> Result<(), AppError> {
    if limit.allows(current) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You have reached the maximum limit of {limit} {what} for your {plan_name} plan. \
             Please upgrade to add more."
        )))
    }
}

/// Fail with 403 unless `count` items fit in `limit`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the limit and the plan.
pub fn ensure_fits(limit: Limit, count: u64, what: &str, plan_name: &str) -> Result<(), AppError> {
    if limit.permits_total(count) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Your {plan_name} plan allows {limit} {what}. Please upgrade to add more."
        )))
    }
}

/// End of a subscription period starting at `start`.
#[must_use]
pub fn period_end(start: DateTime<Utc>, duration: PlanDuration) -> DateTime<Utc> {
    start + Duration::days(duration.length_days())
}

/// Where Shopify sends the merchant after approving a charge.
#[must_use]
pub fn confirmation_return_url(
    shop: &ShopDomain,
    app_handle: &str,
    host: Option<&str>,
    plan_id: PlanId,
) -> String {
    let mut url = format!(
        "https://{shop}/admin/apps/{app_handle}/confirmation?shop={}",
        urlencoding::encode(shop.as_str())
    );
    if let Some(host) = host {
        url.push_str("&host=");
        url.push_str(&urlencoding::encode(host));
    }
    url.push_str(&format!("&subscriptionId={plan_id}"));
    url
}

/// Check a plan catalog before it is written.
///
/// Returns one message per problem; an empty list means the catalog is valid.
#[must_use]
pub fn validate_catalog(plans: &[PlanDefinition]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for plan in plans {
        let name = plan.name.trim();
        if name.is_empty() {
            errors.push("plan with empty name".to_string());
            continue;
        }
        if plan.amount.is_sign_negative() && !plan.amount.is_zero() {
            errors.push(format!("{name}: amount must not be negative"));
        }
        if !seen.insert((name.to_lowercase(), plan.duration)) {
            errors.push(format!("{name}: duplicate {:?} plan", plan.duration));
        }
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use share_cart_core::PlanPermissions;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_ensure_room() {
        assert!(ensure_room(Limit::Limited(2), 1, "live coupons", "Starter").is_ok());
        assert!(ensure_room(Limit::Unlimited, 10_000, "live coupons", "Premium").is_ok());

        let err = ensure_room(Limit::Limited(2), 2, "live coupons", "Starter").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("maximum limit of 2 live coupons"));
        assert!(err.to_string().contains("Starter plan"));
    }

    #[test]
    fn test_ensure_fits() {
        assert!(ensure_fits(Limit::Limited(2), 2, "widget placements", "Starter").is_ok());
        assert!(ensure_fits(Limit::Limited(2), 3, "widget placements", "Starter").is_err());
    }

    #[test]
    fn test_period_end() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            period_end(start, PlanDuration::Monthly),
            Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            period_end(start, PlanDuration::Yearly),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_confirmation_return_url() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        assert_eq!(
            confirmation_return_url(&shop, "share-cart", Some("YWRtaW4="), PlanId::new(3)),
            "https://demo.myshopify.com/admin/apps/share-cart/confirmation\
             ?shop=demo.myshopify.com&host=YWRtaW4%3D&subscriptionId=3"
        );
        assert_eq!(
            confirmation_return_url(&shop, "share-cart", None, PlanId::new(3)),
            "https://demo.myshopify.com/admin/apps/share-cart/confirmation\
             ?shop=demo.myshopify.com&subscriptionId=3"
        );
    }

    fn definition(name: &str, amount: Decimal, duration: PlanDuration) -> PlanDefinition {
        PlanDefinition {
            name: name.to_string(),
            amount,
            duration,
            description: String::new(),
            features: Vec::new(),
            permissions: PlanPermissions::default(),
        }
    }

    #[test]
    fn test_validate_catalog() {
        let valid = [
            definition("Free", Decimal::ZERO, PlanDuration::Monthly),
            definition("Starter", Decimal::new(999, 2), PlanDuration::Monthly),
            definition("Starter", Decimal::new(999, 2), PlanDuration::Yearly),
        ];
        assert!(validate_catalog(&valid).is_empty());

        let invalid = [
            definition("Starter", Decimal::new(999, 2), PlanDuration::Monthly),
            definition("starter", Decimal::new(999, 2), PlanDuration::Monthly),
            definition("Broken", Decimal::new(-1, 0), PlanDuration::Monthly),
            definition("  ", Decimal::ZERO, PlanDuration::Monthly),
        ];
        let errors = validate_catalog(&invalid);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("duplicate")));
        assert!(errors.iter().any(|e| e.contains("Broken")));
    }
}
