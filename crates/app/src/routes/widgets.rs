//! Widget settings route handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use share_cart_core::ShopDomain;

use crate::error::AppError;
use crate::middleware::{ApiJson, ShopSession};
use crate::models::{SaveWidgetRequest, WidgetWithCoupon};
use crate::services::widget_sync;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WidgetResponse {
    pub success: bool,
    pub widget: Option<WidgetWithCoupon>,
    pub shop: ShopDomain,
}

/// The shop's widget settings, or `null` before the first save.
///
/// GET /api/widgets
pub async fn show(
    State(state): State<AppState>,
    session: ShopSession,
) -> Result<Json<WidgetResponse>, AppError> {
    let widget = widget_sync::load(&state, &session.shop).await?;
    Ok(Json(WidgetResponse {
        success: true,
        widget,
        shop: session.shop,
    }))
}

/// Create or replace the widget settings and sync the storefront metafield.
///
/// POST /api/widgets
pub async fn save(
    State(state): State<AppState>,
    session: ShopSession,
    ApiJson(request): ApiJson<SaveWidgetRequest>,
) -> Result<Json<WidgetResponse>, AppError> {
    let widget = widget_sync::save(&state, &session.shop, &session.admin, &request).await?;
    Ok(Json(WidgetResponse {
        success: true,
        widget: Some(widget),
        shop: session.shop,
    }))
}
