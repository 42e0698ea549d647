//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Install (public)
//! GET  /api/auth?shop=                  - Start OAuth grant
//! GET  /api/auth/callback               - Finish OAuth grant
//! POST /api/webhooks                    - Shopify webhooks (HMAC)
//!
//! # Merchant API (App Bridge session token)
//! GET  /api/coupons                     - List coupons
//! POST /api/coupons                     - Create coupon
//! GET  /api/coupons/{id}                - Coupon detail
//! PUT  /api/coupons/{id}                - Update coupon
//! DELETE /api/coupons/{id}              - Delete coupon
//! POST /api/coupons/{id}/activate       - Make the shop's active coupon
//! POST /api/coupons/{id}/deactivate     - Deactivate coupon
//! GET  /api/widgets                     - Widget settings
//! POST /api/widgets                     - Save widget settings
//! GET  /api/products                    - Product picker
//! GET  /api/collections                 - Collection picker
//! GET  /api/billing/fetch-subscription  - Plan catalog
//! GET  /api/billing/check-subscription  - Current subscription
//! POST /api/billing/create              - Subscribe to a plan
//! GET  /api/billing/confirmation        - Record an approved charge
//! GET  /analytics/dashboard             - Dashboard figures
//! GET  /analytics/coupon-activities     - Redemption feed
//!
//! # Storefront (public, CORS)
//! POST /analytics/share                 - Record a cart share
//! POST /analytics/coupon-usage          - Record a redemption
//! POST /coupons/{code}/click?shop=      - Count a link click
//! GET  /tools/share-cart                - App proxy landing page
//! GET  /share-cart-landing.js           - Cart restoration script
//! POST /api/share-cart/decode           - Decode a shared cart
//! ```

pub mod analytics;
pub mod auth;
pub mod billing;
pub mod catalog;
pub mod coupons;
pub mod proxy;
pub mod webhooks;
pub mod widgets;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// CORS for the public storefront endpoints.
///
/// Storefronts run on custom domains as well as `*.myshopify.com`, so any
/// origin is allowed. Requests carry no cookies; the shop comes from a
/// validated `shop` parameter and must be installed.
#[must_use]
pub fn storefront_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Merchant API and install routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Install
        .route("/api/auth", get(auth::install))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/webhooks", post(webhooks::receive))
        // Coupons
        .route("/api/coupons", get(coupons::list).post(coupons::create))
        .route(
            "/api/coupons/{id}",
            get(coupons::show)
                .put(coupons::update)
                .delete(coupons::delete),
        )
        .route("/api/coupons/{id}/activate", post(coupons::activate))
        .route("/api/coupons/{id}/deactivate", post(coupons::deactivate))
        // Widget
        .route("/api/widgets", get(widgets::show).post(widgets::save))
        // Catalog
        .route("/api/products", get(catalog::products))
        .route("/api/collections", get(catalog::collections))
        // Billing
        .route("/api/billing/fetch-subscription", get(billing::plans))
        .route("/api/billing/check-subscription", get(billing::check))
        .route("/api/billing/create", post(billing::create))
        .route("/api/billing/confirmation", get(billing::confirm))
        // Analytics
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/coupon-activities", get(analytics::activities))
}

/// Public routes called from storefront pages.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/share", post(analytics::record_share))
        .route("/analytics/coupon-usage", post(analytics::record_usage))
        .route("/coupons/{code}/click", post(coupons::record_click))
        .route("/tools/share-cart", get(proxy::landing))
        .route("/share-cart-landing.js", get(proxy::landing_script))
        .route("/api/share-cart/decode", post(proxy::decode))
        .layer(storefront_cors())
}

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(api_routes())
        .merge(storefront_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn preflight(origin: &'static str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/analytics/share")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        use tower::ServiceExt;

        let app: Router = Router::new()
            .route("/analytics/share", post(|| async { "ok" }))
            .layer(storefront_cors());

        for origin in [
            "https://demo.myshopify.com",
            "https://www.custom-storefront.com",
        ] {
            let response = app.clone().oneshot(preflight(origin)).await.unwrap();
            assert!(response.status().is_success());
            assert_eq!(
                response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*"
            );
            assert!(response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .is_none());
        }
    }
}
