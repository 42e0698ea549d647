//! Storefront-facing pages reached through the Shopify app proxy.
//!
//! A shared link points at `https://{shop}/tools/share-cart?cart=...`;
//! Shopify forwards it here with a signature over the query string.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::middleware::ApiJson;
use crate::services::ValidationError;
use crate::shopify::verify::verify_proxy_signature;
use crate::state::AppState;

const LANDING_SCRIPT: &str = include_str!("../../static/share-cart-landing.js");

/// Landing page that restores a shared cart.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub shop: String,
    pub script_url: String,
    pub api_base: String,
}

/// Serve the landing page for a verified app proxy request.
///
/// GET /tools/share-cart
pub async fn landing(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    if !verify_proxy_signature(&params, state.shopify().api_secret()) {
        warn!("Rejected app proxy request with invalid signature");
        return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
    }

    let shop = params
        .iter()
        .find_map(|(k, v)| (k == "shop").then(|| v.clone()))
        .unwrap_or_default();
    debug!(shop = %shop, "Serving shared cart landing page");

    let api_base = state.app_url().as_str().trim_end_matches('/').to_string();
    LandingTemplate {
        shop,
        script_url: format!("{api_base}/share-cart-landing.js"),
        api_base,
    }
    .into_response()
}

/// The cart restoration script loaded by the landing page.
///
/// GET /share-cart-landing.js
pub async fn landing_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        LANDING_SCRIPT,
    )
}

/// Decode a base64-encoded shared cart.
///
/// # Errors
///
/// Returns `ValidationError::InvalidCart` if the input is not base64 or the
/// decoded bytes are not JSON.
pub fn decode_cart(encoded: &str) -> Result<serde_json::Value, ValidationError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ValidationError::InvalidCart(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ValidationError::InvalidCart(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub cart: String,
}

#[derive(Debug, Serialize)]
pub struct DecodeResponse {
    pub success: bool,
    pub cart: serde_json::Value,
}

/// POST /api/share-cart/decode
pub async fn decode(
    ApiJson(request): ApiJson<DecodeRequest>,
) -> Result<Json<DecodeResponse>, AppError> {
    let cart = decode_cart(&request.cart)
        .map_err(|_| AppError::BadRequest("Invalid cart data".to_string()))?;
    Ok(Json(DecodeResponse {
        success: true,
        cart,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_cart() {
        let encoded = STANDARD.encode(r#"{"items":[{"id":4242,"quantity":2}],"discount":"SUM1234"}"#);
        let cart = decode_cart(&encoded).unwrap();
        assert_eq!(cart["items"][0]["quantity"], 2);
        assert_eq!(cart["discount"], "SUM1234");
    }

    #[test]
    fn test_decode_cart_rejects_garbage() {
        assert!(matches!(decode_cart("%%%"), Err(ValidationError::InvalidCart(_))));
        let not_json = STANDARD.encode("hello");
        assert!(matches!(decode_cart(&not_json), Err(ValidationError::InvalidCart(_))));
    }

    #[test]
    fn test_landing_template_renders_shop() {
        let html = LandingTemplate {
            shop: "demo.myshopify.com".to_string(),
            script_url: "https://app.example.com/share-cart-landing.js".to_string(),
            api_base: "https://app.example.com".to_string(),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"data-shop="demo.myshopify.com""#));
        assert!(html.contains("share-cart-landing.js"));
    }

    #[test]
    fn test_landing_script_is_embedded() {
        assert!(LANDING_SCRIPT.contains("/cart/add.js"));
        assert!(LANDING_SCRIPT.contains("?redirect=/cart"));
    }
}
