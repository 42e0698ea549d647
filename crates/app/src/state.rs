//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use url::Url;

use share_cart_core::ShopDomain;

use crate::config::AppConfig;
use crate::shopify::ShopifyApp;

/// How long a shop's global ID stays cached.
const SHOP_GID_TTL: Duration = Duration::from_secs(60 * 60);
const SHOP_GID_CAPACITY: u64 = 10_000;

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid APP_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("APP_URL must use https or http, got {0}")]
    UnsupportedScheme(String),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    shopify: ShopifyApp,
    app_url: Url,
    shop_gids: Cache<ShopDomain, String>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_URL` is not an absolute http(s) URL.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let app_url = Url::parse(&config.app_url)?;
        if !matches!(app_url.scheme(), "https" | "http") {
            return Err(StateError::UnsupportedScheme(app_url.scheme().to_string()));
        }

        let shopify = ShopifyApp::new(&config.shopify);
        let shop_gids = Cache::builder()
            .max_capacity(SHOP_GID_CAPACITY)
            .time_to_live(SHOP_GID_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                app_url,
                shop_gids,
            }),
        })
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify app.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyApp {
        &self.inner.shopify
    }

    /// Public base URL of the app.
    #[must_use]
    pub fn app_url(&self) -> &Url {
        &self.inner.app_url
    }

    /// Absolute URL for a path on this app.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        self.inner
            .app_url
            .join(path)
            .map_or_else(|_| format!("{}{path}", self.inner.config.app_url), String::from)
    }

    /// Cache of shop global IDs, keyed by shop domain.
    #[must_use]
    pub fn shop_gids(&self) -> &Cache<ShopDomain, String> {
        &self.inner.shop_gids
    }
}
