//! Integration tests for the JSON error envelope.
//!
//! Every handler failure renders `{"success": false, "message": ...}` with
//! the status the error maps to.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use share_cart_app::error::AppError;
use share_cart_app::middleware::ApiJson;
use share_cart_app::routes::analytics::RecordShareRequest;
use share_cart_app::shopify::{ShopifyError, UserError};
use tower::ServiceExt;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    read(err.into_response()).await
}

async fn read(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, body)
}

#[tokio::test]
async fn test_client_errors_keep_message() {
    let (status, body) = render(AppError::Forbidden(
        "Your Starter plan allows a maximum limit of 5 live coupons".to_string(),
    ))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap_or_default().contains("live coupons"));

    let (status, body) = render(AppError::NotFound("Coupon not found".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Coupon not found");
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let (status, body) = render(AppError::Internal("connection reset".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_shopify_user_errors_become_bad_request() {
    let err = AppError::from(ShopifyError::UserErrors(vec![UserError {
        field: Some(vec!["basicCodeDiscount".to_string(), "code".to_string()]),
        message: "Code must be unique".to_string(),
        code: Some("TAKEN".to_string()),
    }]));
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Code must be unique");
    assert_eq!(body["userErrors"][0]["code"], "TAKEN");
}

#[tokio::test]
async fn test_shopify_failures_include_error() {
    let (status, body) = render(AppError::from(ShopifyError::RateLimited(2))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap_or_default().contains("retry after 2"));
}

// =============================================================================
// Request Body Rejections
// =============================================================================

async fn post_share(content_type: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
    let app = Router::new().route(
        "/analytics/share",
        post(|ApiJson(_): ApiJson<RecordShareRequest>| async { StatusCode::CREATED }),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/analytics/share")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router is infallible");
    read(response).await
}

#[tokio::test]
async fn test_unknown_enum_value_is_bad_request() {
    let (status, body) = post_share("application/json", r#"{"platform":"twitter"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap_or_default().contains("twitter"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, body) = post_share("application/json", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = post_share("text/plain", r#"{"platform":"email"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_body_reaches_handler() {
    let app = Router::new().route(
        "/analytics/share",
        post(|ApiJson(_): ApiJson<RecordShareRequest>| async { StatusCode::CREATED }),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/analytics/share")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"platform":"whatsapp","cartValue":"12.50"}"#))
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::CREATED);
}
