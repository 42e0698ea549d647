//! Shop authentication for the embedded admin API.
//!
//! Merchant endpoints take a [`ShopSession`] argument. Extraction verifies the
//! App Bridge session token and loads the shop's offline token, so handlers
//! receive a ready Admin API client scoped to the calling shop.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

use share_cart_core::ShopDomain;

use crate::db::{RepositoryError, ShopRepository};
use crate::error::AppError;
use crate::shopify::AdminClient;
use crate::shopify::session_token::{self, SessionTokenError};
use crate::state::AppState;

/// Reasons a merchant request is not authenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing session token")]
    MissingToken,
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] SessionTokenError),
    #[error("Shop is not installed")]
    NotInstalled,
    #[error("Shop lookup failed: {0}")]
    Database(#[from] RepositoryError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(e) => Self::Database(e),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// The authenticated shop of a merchant request.
#[derive(Debug, Clone)]
pub struct ShopSession {
    pub shop: ShopDomain,
    pub admin: AdminClient,
}

/// Extract the bearer token from an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for ShopSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let shopify = state.shopify();
        let (shop, claims) =
            session_token::verify(token, shopify.api_key(), shopify.api_secret())?;

        let installed = ShopRepository::new(state.pool())
            .get(&shop)
            .await?
            .ok_or(AuthError::NotInstalled)?;

        debug!(shop = %shop, user = ?claims.sub, "Session token accepted");

        Ok(Self {
            admin: shopify.admin(&shop, &installed.access_token),
            shop,
        })
    }
}
