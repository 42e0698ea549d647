//! Coupon route handlers.
//!
//! Merchant CRUD lives under `/api/coupons` and requires a session token.
//! The click counter is called from the storefront landing page.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use share_cart_core::{CouponId, ShopDomain};

use crate::db::CouponRepository;
use crate::error::AppError;
use crate::middleware::{ApiJson, ShopSession};
use crate::models::{Coupon, CouponSummary, CreateCouponRequest, UpdateCouponRequest};
use crate::services::coupons;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CouponListResponse {
    pub success: bool,
    pub coupons: Vec<CouponSummary>,
}

#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub coupon: Coupon,
}

impl CouponResponse {
    const fn new(message: Option<&'static str>, coupon: Coupon) -> Self {
        Self {
            success: true,
            message,
            coupon,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// List the shop's coupons, newest first.
///
/// GET /api/coupons
pub async fn list(
    State(state): State<AppState>,
    session: ShopSession,
) -> Result<Json<CouponListResponse>, AppError> {
    let coupons = CouponRepository::new(state.pool()).list(&session.shop).await?;
    Ok(Json(CouponListResponse {
        success: true,
        coupons,
    }))
}

/// Get one coupon.
///
/// GET /api/coupons/{id}
pub async fn show(
    State(state): State<AppState>,
    session: ShopSession,
    Path(id): Path<i32>,
) -> Result<Json<CouponResponse>, AppError> {
    let coupon = CouponRepository::new(state.pool())
        .get(&session.shop, CouponId::new(id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Coupon not found or does not belong to this shop".to_string())
        })?;
    Ok(Json(CouponResponse::new(None, coupon)))
}

/// Create a coupon and its Shopify discount.
///
/// POST /api/coupons
pub async fn create(
    State(state): State<AppState>,
    session: ShopSession,
    ApiJson(request): ApiJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>), AppError> {
    let coupon = coupons::create(&state, &session.shop, &session.admin, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CouponResponse::new(Some("Coupon created successfully"), coupon)),
    ))
}

/// Partially update a coupon.
///
/// PUT /api/coupons/{id}
pub async fn update(
    State(state): State<AppState>,
    session: ShopSession,
    Path(id): Path<i32>,
    ApiJson(patch): ApiJson<UpdateCouponRequest>,
) -> Result<Json<CouponResponse>, AppError> {
    let coupon = coupons::update(
        &state,
        &session.shop,
        &session.admin,
        CouponId::new(id),
        &patch,
    )
    .await?;
    Ok(Json(CouponResponse::new(
        Some("Coupon updated successfully"),
        coupon,
    )))
}

/// Delete a coupon.
///
/// DELETE /api/coupons/{id}
pub async fn delete(
    State(state): State<AppState>,
    session: ShopSession,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    coupons::delete(&state, &session.shop, &session.admin, CouponId::new(id)).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Coupon deleted successfully",
    }))
}

/// Make a coupon the shop's active coupon.
///
/// POST /api/coupons/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    session: ShopSession,
    Path(id): Path<i32>,
) -> Result<Json<CouponResponse>, AppError> {
    let coupon =
        coupons::activate(&state, &session.shop, &session.admin, CouponId::new(id)).await?;
    Ok(Json(CouponResponse::new(
        Some("Coupon activated successfully"),
        coupon,
    )))
}

/// Deactivate a coupon.
///
/// POST /api/coupons/{id}/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    session: ShopSession,
    Path(id): Path<i32>,
) -> Result<Json<CouponResponse>, AppError> {
    let coupon =
        coupons::deactivate(&state, &session.shop, &session.admin, CouponId::new(id)).await?;
    Ok(Json(CouponResponse::new(
        Some("Coupon deactivated successfully"),
        coupon,
    )))
}

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub shop: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub success: bool,
    pub coupon_id: CouponId,
}

/// Count a click on a shared coupon link.
///
/// POST /coupons/{code}/click?shop=
pub async fn record_click(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ClickQuery>,
) -> Result<Json<ClickResponse>, AppError> {
    let shop = ShopDomain::parse(&query.shop)
        .map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))?;
    let coupon_id = coupons::record_click(state.pool(), &shop, &code).await?;
    Ok(Json(ClickResponse {
        success: true,
        coupon_id,
    }))
}
