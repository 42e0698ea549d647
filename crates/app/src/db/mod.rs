//! Database operations for the app's `PostgreSQL` schema.
//!
//! # Schema: `share_cart`
//!
//! ## Tables
//!
//! - `shops` - Offline Admin API tokens per installed shop
//! - `coupons` - Merchant coupons mirrored to Shopify discount codes
//! - `share_events` - Append-only cart shares
//! - `coupon_usages` - Append-only coupon redemptions
//! - `processed_orders` - Idempotency keys for order reconciliation
//! - `widgets` - Storefront widget settings, one per shop
//! - `plans` - Billing plan catalog
//! - `shop_subscriptions` - Plan subscriptions per shop
//! - `session` - tower-sessions storage (OAuth state)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p share-cart-cli -- migrate
//! ```

pub mod analytics;
pub mod billing;
pub mod coupons;
pub mod privacy;
pub mod shops;
pub mod widgets;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use billing::BillingRepository;
pub use coupons::CouponRepository;
pub use privacy::PrivacyRepository;
pub use shops::ShopRepository;
pub use widgets::WidgetRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate coupon code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to `Conflict`, leaving other errors as-is.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse a shop domain read back from the database.
pub(crate) fn parse_shop(shop: &str) -> Result<share_cart_core::ShopDomain, RepositoryError> {
    share_cart_core::ShopDomain::parse(shop)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid shop domain in database: {e}")))
}
