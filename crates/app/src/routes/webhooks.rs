//! Shopify webhook receiver.
//!
//! Every topic posts to one endpoint. The HMAC of the raw body is checked
//! before anything is parsed; after that the webhook is always acknowledged
//! and processing failures are only logged, since Shopify would otherwise
//! keep retrying deliveries we cannot handle.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use share_cart_core::ShopDomain;

use crate::db::privacy::CustomerRef;
use crate::db::{PrivacyRepository, ShopRepository};
use crate::error::AppError;
use crate::services::reconcile::{self, IdValue, OrderPayload};
use crate::shopify::verify::verify_webhook;
use crate::state::AppState;

pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const SHOP_HEADER: &str = "x-shopify-shop-domain";
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Topics the app acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    OrdersCreate,
    OrdersFulfilled,
    CustomersDataRequest,
    CustomersRedact,
    ShopRedact,
    AppUninstalled,
}

impl WebhookTopic {
    /// Parse an `X-Shopify-Topic` value such as `orders/create`.
    #[must_use]
    pub fn parse(topic: &str) -> Option<Self> {
        match topic.trim().to_ascii_lowercase().as_str() {
            "orders/create" => Some(Self::OrdersCreate),
            "orders/fulfilled" => Some(Self::OrdersFulfilled),
            "customers/data_request" => Some(Self::CustomersDataRequest),
            "customers/redact" => Some(Self::CustomersRedact),
            "shop/redact" => Some(Self::ShopRedact),
            "app/uninstalled" => Some(Self::AppUninstalled),
            _ => None,
        }
    }
}

/// A webhook that cannot be accepted.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid shop domain: {0}")]
    InvalidShop(String),
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::InvalidSignature => Self::Unauthorized(err.to_string()),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

/// Check a delivery's signature and extract its topic and shop.
///
/// # Errors
///
/// Returns `InvalidSignature` when the HMAC does not match the body, or a
/// header error when a required header is absent or malformed.
pub fn authenticate(
    headers: &HeaderMap,
    body: &[u8],
    secret: &[u8],
) -> Result<(String, ShopDomain), WebhookError> {
    let hmac = header(headers, HMAC_HEADER)?;
    if !verify_webhook(body, hmac, secret) {
        return Err(WebhookError::InvalidSignature);
    }

    let topic = header(headers, TOPIC_HEADER)?.to_string();
    let shop = ShopDomain::parse(header(headers, SHOP_HEADER)?)
        .map_err(|e| WebhookError::InvalidShop(e.to_string()))?;
    Ok((topic, shop))
}

/// Customer section of the GDPR webhook payloads.
#[derive(Debug, Default, Deserialize)]
pub struct PrivacyCustomer {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrivacyPayload {
    #[serde(default)]
    pub customer: PrivacyCustomer,
}

impl PrivacyPayload {
    #[must_use]
    pub fn customer_ref(&self) -> CustomerRef {
        CustomerRef {
            customer_id: self.customer.id.as_ref().map(ToString::to_string),
            email: self
                .customer
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }
}

/// Receive a Shopify webhook.
///
/// POST /api/webhooks
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let (topic, shop) = authenticate(&headers, &body, state.shopify().api_secret())?;

    match WebhookTopic::parse(&topic) {
        Some(known) => handle(&state, known, &shop, &body).await,
        None => info!(shop = %shop, topic = %topic, "Ignoring unhandled webhook topic"),
    }

    Ok(StatusCode::OK)
}

#[instrument(skip(state, body), fields(shop = %shop))]
async fn handle(state: &AppState, topic: WebhookTopic, shop: &ShopDomain, body: &[u8]) {
    let pool = state.pool();

    match topic {
        WebhookTopic::OrdersCreate | WebhookTopic::OrdersFulfilled => {
            let order = match OrderPayload::from_slice(body) {
                Ok(order) => order,
                Err(e) => {
                    warn!(error = %e, "Unparseable order webhook");
                    return;
                }
            };
            match reconcile::reconcile_order(pool, shop, &order).await {
                Ok(outcome) => info!(order_id = %order.id, ?outcome, "Order webhook processed"),
                Err(e) => error!(order_id = %order.id, error = %e, "Order reconciliation failed"),
            }
        }
        WebhookTopic::CustomersDataRequest | WebhookTopic::CustomersRedact => {
            let payload: PrivacyPayload = match serde_json::from_slice(body) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Unparseable privacy webhook");
                    return;
                }
            };
            let customer = payload.customer_ref();
            let repo = PrivacyRepository::new(pool);

            if topic == WebhookTopic::CustomersDataRequest {
                match repo.count_customer_records(shop, &customer).await {
                    Ok(counts) => info!(
                        share_events = counts.share_events,
                        coupon_usages = counts.coupon_usages,
                        "Customer data request received"
                    ),
                    Err(e) => error!(error = %e, "Failed to count customer records"),
                }
            } else {
                match repo.redact_customer(shop, &customer).await {
                    Ok(counts) => info!(
                        share_events = counts.share_events,
                        coupon_usages = counts.coupon_usages,
                        "Customer data redacted"
                    ),
                    Err(e) => error!(error = %e, "Failed to redact customer data"),
                }
            }
        }
        WebhookTopic::ShopRedact => {
            if let Err(e) = PrivacyRepository::new(pool).redact_shop(shop).await {
                error!(error = %e, "Failed to redact shop data");
            } else {
                state.shop_gids().invalidate(shop).await;
                info!("Shop data redacted");
            }
        }
        WebhookTopic::AppUninstalled => {
            match ShopRepository::new(pool).delete_token(shop).await {
                Ok(deleted) => info!(deleted, "App uninstalled"),
                Err(e) => error!(error = %e, "Failed to delete access token"),
            }
            state.shop_gids().invalidate(shop).await;
        }
    }
}
