//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The only thing
//! kept in a session is the OAuth `state` nonce between the install redirect
//! and the callback, so sessions are short-lived.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "share_cart_session";

/// Session key holding the OAuth state nonce.
pub const OAUTH_STATE_KEY: &str = "oauth_state";

/// Session expiry time in seconds (OAuth round trips take seconds).
const SESSION_EXPIRY_SECONDS: i64 = 10 * 60;

/// The session store could not be configured.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store setting: {0}")]
pub struct SessionStoreError(String);

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AppConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    // The session table is created by the initial migration.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("share_cart")
        .map_err(SessionStoreError)?
        .with_table_name("session")
        .map_err(SessionStoreError)?;

    let is_secure = config.app_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        // The callback is a top-level navigation from Shopify's domain
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}
