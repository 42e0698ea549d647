//! App installation via Shopify OAuth.
//!
//! - Install: stores a random state in the session and redirects to the
//!   shop's grant screen
//! - Callback: verifies the HMAC, state and shop, stores the offline token,
//!   registers webhooks and sends the merchant into the embedded app

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use share_cart_core::ShopDomain;

use crate::db::ShopRepository;
use crate::error::AppError;
use crate::middleware::session::OAUTH_STATE_KEY;
use crate::shopify::AdminClient;
use crate::shopify::verify::verify_oauth_query;
use crate::state::AppState;

/// Topics registered for every installed shop.
pub const WEBHOOK_TOPICS: [&str; 3] = ["ORDERS_CREATE", "ORDERS_FULFILLED", "APP_UNINSTALLED"];

const STATE_LENGTH: usize = 32;

/// Pending OAuth grant stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGrant {
    pub state: String,
    pub shop: ShopDomain,
}

/// Generate a random alphanumeric state nonce.
fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    pub shop: String,
}

/// Start the OAuth grant for a shop.
///
/// GET /api/auth?shop=
pub async fn install(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InstallQuery>,
) -> Result<Redirect, AppError> {
    let shop = ShopDomain::parse(&query.shop)
        .map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))?;

    let grant = PendingGrant {
        state: generate_state(),
        shop: shop.clone(),
    };
    session
        .insert(OAUTH_STATE_KEY, &grant)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store OAuth state: {e}")))?;

    let url = state.shopify().authorization_url(
        &shop,
        &state.config().oauth_redirect_uri(),
        &grant.state,
    );
    Ok(Redirect::to(&url))
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find_map(|(k, v)| (k == key).then_some(v.as_str()))
}

/// Subscribe a freshly installed shop to the app's webhook topics.
///
/// Failures are logged; the install itself still succeeds.
pub async fn register_webhooks(admin: &AdminClient, callback_url: &str) {
    for topic in WEBHOOK_TOPICS {
        if let Err(e) = admin.create_webhook(topic, callback_url).await {
            warn!(shop = %admin.shop(), topic, error = %e, "Failed to register webhook");
        }
    }
}

/// Map a session store failure while reading the OAuth grant.
fn session_failure(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("Failed to read OAuth state: {err}"))
}

/// Check the callback against the grant started in this session.
fn check_grant(
    grant: Option<&PendingGrant>,
    returned_state: &str,
    shop: &ShopDomain,
) -> Result<(), AppError> {
    match grant {
        Some(grant) if grant.state == returned_state && &grant.shop == shop => Ok(()),
        _ => {
            warn!(shop = %shop, "OAuth state mismatch");
            Err(AppError::Unauthorized("Invalid OAuth state".to_string()))
        }
    }
}

/// Finish the OAuth grant.
///
/// GET /api/auth/callback
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let shopify = state.shopify();
    if !verify_oauth_query(&params, shopify.api_secret()) {
        return Err(AppError::Unauthorized("Invalid OAuth signature".to_string()));
    }

    let shop = param(&params, "shop")
        .ok_or_else(|| AppError::BadRequest("Missing shop".to_string()))
        .and_then(|s| {
            ShopDomain::parse(s).map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))
        })?;
    let code = param(&params, "code")
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let returned_state = param(&params, "state")
        .ok_or_else(|| AppError::BadRequest("Missing OAuth state".to_string()))?;

    // One-time use
    let grant: Option<PendingGrant> = session
        .remove(OAUTH_STATE_KEY)
        .await
        .map_err(session_failure)?;
    check_grant(grant.as_ref(), returned_state, &shop)?;

    let token = shopify.exchange_code(&shop, code).await?;
    ShopRepository::new(state.pool())
        .upsert_token(&shop, &token.access_token, &token.scope)
        .await?;
    info!(shop = %shop, scope = %token.scope, "Shop installed");

    let admin = shopify.admin(&shop, &token.access_token);
    register_webhooks(&admin, &state.url_for("/api/webhooks")).await;

    let handle = &state.config().shopify.app_handle;
    Ok(Redirect::to(&format!("https://{shop}/admin/apps/{handle}")))
}
