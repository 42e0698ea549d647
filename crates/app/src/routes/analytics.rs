//! Analytics route handlers.
//!
//! Share and usage recording are public storefront endpoints (CORS); the
//! dashboard and activity feed are merchant endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use share_cart_core::{SharePlatform, ShopDomain, Timeframe, UserType};

use crate::db::{AnalyticsRepository, CouponRepository, ShopRepository};
use crate::error::AppError;
use crate::middleware::{ApiJson, ShopSession};
use crate::models::{CouponActivity, NewCouponUsage, NewShareEvent, ShareEvent};
use crate::services::billing::{current_subscription, ensure_room};
use crate::services::dashboard::{self, DashboardData};
use crate::state::AppState;

/// Optional `?shop=` accepted by the storefront endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

/// Resolve the shop of a storefront request and check it is installed.
async fn installed_shop(
    state: &AppState,
    body_shop: Option<&str>,
    query_shop: Option<&str>,
) -> Result<ShopDomain, AppError> {
    let raw = body_shop
        .or(query_shop)
        .ok_or_else(|| AppError::BadRequest("Shop identifier required".to_string()))?;
    let shop = ShopDomain::parse(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))?;

    ShopRepository::new(state.pool())
        .get(&shop)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    Ok(shop)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Share events
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordShareRequest {
    pub shop: Option<String>,
    pub platform: SharePlatform,
    pub coupon_code: Option<String>,
    pub cart_value: Option<Decimal>,
    pub customer_id: Option<String>,
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEventResponse {
    pub success: bool,
    pub share_event: ShareEvent,
}

/// Record a cart share from the storefront widget.
///
/// POST /analytics/share
#[instrument(skip_all)]
pub async fn record_share(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<RecordShareRequest>,
) -> Result<(StatusCode, Json<ShareEventResponse>), AppError> {
    let shop = installed_shop(&state, request.shop.as_deref(), query.shop.as_deref()).await?;
    let pool = state.pool();
    let analytics = AnalyticsRepository::new(pool);

    let current = current_subscription(pool, &shop, Utc::now()).await?;
    let shared = analytics
        .count_shares_since(&shop, current.subscription.start_date)
        .await?;
    ensure_room(
        current.plan.permissions.cart_shares,
        shared,
        "cart shares",
        &current.plan.name,
    )?;

    let coupon_code = non_empty(request.coupon_code);
    let coupon_id = match &coupon_code {
        Some(code) => CouponRepository::new(pool).record_sent(&shop, code).await?,
        None => None,
    };

    let event = NewShareEvent {
        shop: shop.clone(),
        platform: request.platform,
        coupon_id,
        coupon_code,
        cart_value: request.cart_value,
        customer_id: non_empty(request.customer_id),
        sender_email: non_empty(request.sender_email),
        recipient_email: non_empty(request.recipient_email),
        device_type: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let share_event = analytics.insert_share(&event).await?;

    debug!(shop = %shop, share_id = %share_event.id, "Share recorded");
    Ok((
        StatusCode::CREATED,
        Json(ShareEventResponse {
            success: true,
            share_event,
        }),
    ))
}

// ============================================================================
// Coupon usage
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUsageRequest {
    pub shop: Option<String>,
    pub coupon_code: String,
    pub user_type: String,
    pub order_id: Option<String>,
    pub order_value: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    pub success: bool,
    /// `false` when the order was already reconciled or this code already reported for it.
    pub recorded: bool,
}

/// Record a coupon redemption reported by the storefront.
///
/// POST /analytics/coupon-usage
#[instrument(skip_all)]
pub async fn record_usage(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    ApiJson(request): ApiJson<RecordUsageRequest>,
) -> Result<(StatusCode, Json<RecordUsageResponse>), AppError> {
    let shop = installed_shop(&state, request.shop.as_deref(), query.shop.as_deref()).await?;
    let user_type: UserType = request.user_type.parse().map_err(AppError::BadRequest)?;

    let code = request.coupon_code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".to_string()));
    }

    let coupon = CouponRepository::new(state.pool())
        .find_by_code(&shop, code)
        .await?;

    let usage = NewCouponUsage {
        shop: shop.clone(),
        coupon_id: coupon.as_ref().map(|c| c.id),
        coupon_name: coupon
            .as_ref()
            .map_or_else(|| code.to_string(), |c| c.name.clone()),
        coupon_code: coupon
            .as_ref()
            .map_or_else(|| code.to_uppercase(), |c| c.code.clone()),
        user_type,
        order_id: non_empty(request.order_id),
        order_value: request.order_value.unwrap_or_default(),
        discount_amount: request.discount_amount.unwrap_or_default(),
        customer_id: non_empty(request.customer_id),
        customer_name: non_empty(request.customer_name),
        customer_email: None,
    };

    let recorded = AnalyticsRepository::new(state.pool())
        .record_usage(&usage)
        .await?;

    debug!(shop = %shop, code = %usage.coupon_code, recorded, "Coupon usage reported");
    let status = if recorded {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(RecordUsageResponse {
            success: true,
            recorded,
        }),
    ))
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: DashboardData,
}

/// Dashboard figures for the selected timeframe.
///
/// GET /analytics/dashboard?timeframe=7d|30d|month|year
pub async fn dashboard(
    State(state): State<AppState>,
    session: ShopSession,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let timeframe = Timeframe::from_query(query.timeframe.as_deref());
    let now = Utc::now();
    let start = timeframe.start(now);

    let analytics = AnalyticsRepository::new(state.pool());
    let shares = analytics.shares_between(&session.shop, start, now).await?;
    let usages = analytics
        .usages_between(&session.shop, Some(start), Some(now))
        .await?;

    Ok(Json(DashboardResponse {
        success: true,
        data: dashboard::aggregate(timeframe, &shares, &usages),
    }))
}

// ============================================================================
// Activity feed
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub success: bool,
    pub activities: Vec<CouponActivity>,
}

/// Parse the inclusive start of an activity filter.
///
/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for anything else.
pub fn parse_start_bound(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    Ok(parse_day(value)?.and_time(NaiveTime::MIN).and_utc())
}

/// Parse the exclusive upper bound of an activity filter.
///
/// A plain date covers the whole day, so the bound is the following
/// midnight. A timestamp is itself included.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for input that is neither form.
pub fn parse_end_bound(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc) + TimeDelta::microseconds(1));
    }
    let next = parse_day(value)?
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {value}")))?;
    Ok(next.and_time(NaiveTime::MIN).and_utc())
}

fn parse_day(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {value}")))
}

/// Coupon redemptions, newest first.
///
/// GET /analytics/coupon-activities?startDate=&endDate=
pub async fn activities(
    State(state): State<AppState>,
    session: ShopSession,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>, AppError> {
    let start = non_empty(query.start_date)
        .map(|s| parse_start_bound(&s))
        .transpose()?;
    let end = non_empty(query.end_date)
        .map(|s| parse_end_bound(&s))
        .transpose()?;

    let usages = AnalyticsRepository::new(state.pool())
        .usages_between(&session.shop, start, end)
        .await?;

    Ok(Json(ActivitiesResponse {
        success: true,
        activities: usages.into_iter().map(CouponActivity::from).collect(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_plain_dates_cover_the_whole_day() {
        assert_eq!(
            parse_start_bound("2025-03-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        let end = parse_end_bound("2025-03-01").unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap());

        let last_microsecond = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap()
            + TimeDelta::microseconds(999_999);
        assert!(last_microsecond < end);
        assert_eq!(
            parse_end_bound("2025-12-31").unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_timestamp_bounds() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_start_bound("2025-03-01T10:00:00+02:00").unwrap(), at);
        assert!(parse_end_bound("2025-03-01T10:00:00+02:00").unwrap() > at);
        assert!(parse_start_bound("yesterday").is_err());
        assert!(parse_end_bound("2025-02-30").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" a@b.c ".to_string())), Some("a@b.c".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
