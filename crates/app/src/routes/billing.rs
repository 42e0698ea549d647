//! Billing route handlers: plan catalog, subscription status and checkout.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use share_cart_core::{PlanId, ShopDomain};

use crate::db::BillingRepository;
use crate::error::AppError;
use crate::middleware::{ApiJson, ShopSession};
use crate::models::{Plan, ShopSubscription, SubscriptionWithPlan};
use crate::services::billing::{confirmation_return_url, period_end};
use crate::state::AppState;

/// Admin URL the frontend navigates to once a plan is active.
#[must_use]
pub fn activated_url(shop: &ShopDomain, host: Option<&str>) -> String {
    format!(
        "/?shop={shop}&host={}&subscriptionActive=true",
        urlencoding::encode(host.unwrap_or_default())
    )
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<Plan>,
}

/// List the plan catalog.
///
/// GET /api/billing/fetch-subscription
pub async fn plans(
    State(state): State<AppState>,
    _session: ShopSession,
) -> Result<Json<PlansResponse>, AppError> {
    let plans = BillingRepository::new(state.pool()).list_plans().await?;
    Ok(Json(PlansResponse {
        success: true,
        plans,
    }))
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: SubscriptionWithPlan,
}

/// The shop's latest subscription with its plan.
///
/// GET /api/billing/check-subscription
pub async fn check(
    State(state): State<AppState>,
    session: ShopSession,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = BillingRepository::new(state.pool())
        .latest_subscription(&session.shop)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription found".to_string()))?;

    if subscription.subscription.is_expired(Utc::now()) {
        return Err(AppError::Forbidden("Subscription has expired".to_string()));
    }

    Ok(Json(SubscriptionResponse {
        success: true,
        subscription,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct HostQuery {
    pub host: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub subscription_id: PlanId,
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub free_plan: bool,
}

async fn find_plan(state: &AppState, id: PlanId) -> Result<Plan, AppError> {
    BillingRepository::new(state.pool())
        .get_plan(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))
}

/// Subscribe the shop to a plan.
///
/// Free plans are activated immediately. Paid plans return Shopify's
/// confirmation URL; the subscription is recorded on confirmation.
///
/// POST /api/billing/create
pub async fn create(
    State(state): State<AppState>,
    session: ShopSession,
    Query(query): Query<HostQuery>,
    ApiJson(request): ApiJson<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>, AppError> {
    let plan = find_plan(&state, request.subscription_id).await?;
    let host = request.host.or(query.host);

    if plan.is_free() {
        let start = Utc::now();
        BillingRepository::new(state.pool())
            .create_subscription(
                &session.shop,
                plan.id,
                None,
                start,
                period_end(start, plan.duration),
            )
            .await?;
        info!(shop = %session.shop, plan = %plan.name, "Free plan activated");

        return Ok(Json(CreateSubscriptionResponse {
            success: true,
            confirmation_url: None,
            url: Some(activated_url(&session.shop, host.as_deref())),
            free_plan: true,
        }));
    }

    let shopify = &state.config().shopify;
    let return_url =
        confirmation_return_url(&session.shop, &shopify.app_handle, host.as_deref(), plan.id);
    let confirmation_url = session
        .admin
        .create_app_subscription(
            &plan.name,
            plan.amount,
            plan.duration,
            &return_url,
            shopify.billing_test,
        )
        .await?;

    info!(shop = %session.shop, plan = %plan.name, "App subscription created");
    Ok(Json(CreateSubscriptionResponse {
        success: true,
        confirmation_url: Some(confirmation_url),
        url: None,
        free_plan: false,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationQuery {
    pub subscription_id: PlanId,
    #[serde(rename = "charge_id")]
    pub charge_id: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub success: bool,
    pub url: String,
    pub subscription: ShopSubscription,
}

/// The charge a confirmation must carry for `plan`.
///
/// Free plans carry none. Paid plans require a non-empty `charge_id`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when a paid plan arrives without one.
pub fn required_charge<'a>(
    plan: &Plan,
    charge_id: Option<&'a str>,
) -> Result<Option<&'a str>, AppError> {
    if plan.is_free() {
        return Ok(None);
    }
    charge_id
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("A charge ID is required for paid plans".to_string()))
}

/// Check the status Shopify reports for a charge.
///
/// # Errors
///
/// Returns `AppError::BadRequest` unless the charge is `ACTIVE`.
pub fn require_active(status: Option<&str>) -> Result<(), AppError> {
    match status {
        Some(status) if status.eq_ignore_ascii_case("ACTIVE") => Ok(()),
        Some(status) => Err(AppError::BadRequest(format!(
            "Subscription charge is {}",
            status.to_ascii_lowercase()
        ))),
        None => Err(AppError::BadRequest("Subscription charge not found".to_string())),
    }
}

/// Record the subscription after the merchant approved the charge.
///
/// Paid plans are only recorded once Shopify reports the charge as active.
///
/// GET /api/billing/confirmation?subscriptionId=&charge_id=&host=
pub async fn confirm(
    State(state): State<AppState>,
    session: ShopSession,
    Query(query): Query<ConfirmationQuery>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    let plan = find_plan(&state, query.subscription_id).await?;
    let charge_id = required_charge(&plan, query.charge_id.as_deref())?;
    if let Some(charge) = charge_id {
        let status = session.admin.app_subscription_status(charge).await?;
        require_active(status.as_deref())?;
    }

    let start = Utc::now();
    let subscription = BillingRepository::new(state.pool())
        .create_subscription(
            &session.shop,
            plan.id,
            charge_id,
            start,
            period_end(start, plan.duration),
        )
        .await?;

    info!(shop = %session.shop, plan = %plan.name, charge_id = ?charge_id, "Subscription confirmed");
    Ok(Json(ConfirmationResponse {
        success: true,
        url: activated_url(&session.shop, query.host.as_deref()),
        subscription,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use share_cart_core::{PlanDuration, PlanPermissions};

    use super::*;

    fn plan(amount: &str) -> Plan {
        Plan {
            id: PlanId::new(2),
            name: "Starter".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            duration: PlanDuration::Monthly,
            description: String::new(),
            features: Vec::new(),
            permissions: PlanPermissions::default(),
        }
    }

    #[test]
    fn test_activated_url() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        assert_eq!(
            activated_url(&shop, Some("YWRtaW4=")),
            "/?shop=demo.myshopify.com&host=YWRtaW4%3D&subscriptionActive=true"
        );
        assert_eq!(
            activated_url(&shop, None),
            "/?shop=demo.myshopify.com&host=&subscriptionActive=true"
        );
    }

    #[test]
    fn test_paid_plans_require_a_charge() {
        let paid = plan("29.99");
        assert!(matches!(required_charge(&paid, None), Err(AppError::BadRequest(_))));
        assert!(matches!(required_charge(&paid, Some("  ")), Err(AppError::BadRequest(_))));
        assert_eq!(required_charge(&paid, Some("27361")).unwrap(), Some("27361"));

        let free = plan("0");
        assert_eq!(required_charge(&free, None).unwrap(), None);
        assert_eq!(required_charge(&free, Some("27361")).unwrap(), None);
    }

    #[test]
    fn test_only_active_charges_confirm() {
        assert!(require_active(Some("ACTIVE")).is_ok());
        assert!(matches!(require_active(Some("PENDING")), Err(AppError::BadRequest(_))));
        assert!(matches!(require_active(Some("DECLINED")), Err(AppError::BadRequest(_))));
        assert!(matches!(require_active(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_confirmation_query_names() {
        let query: ConfirmationQuery = serde_json::from_value(serde_json::json!({
            "subscriptionId": 4,
            "charge_id": "gid://shopify/AppSubscription/1"
        }))
        .unwrap();
        assert_eq!(query.subscription_id, PlanId::new(4));
        assert_eq!(query.charge_id.as_deref(), Some("gid://shopify/AppSubscription/1"));
    }
}
