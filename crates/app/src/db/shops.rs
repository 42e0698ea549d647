//! Installed shops and their offline Admin API tokens.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use share_cart_core::ShopDomain;

use super::{RepositoryError, parse_shop};

/// An installed shop's stored credentials.
#[derive(Clone)]
pub struct InstalledShop {
    pub shop: ShopDomain,
    pub access_token: SecretString,
    pub scope: String,
    pub installed_at: DateTime<Utc>,
}

impl std::fmt::Debug for InstalledShop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledShop")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("installed_at", &self.installed_at)
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct ShopRow {
    shop: String,
    access_token: String,
    scope: String,
    installed_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for InstalledShop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shop: parse_shop(&row.shop)?,
            access_token: SecretString::from(row.access_token),
            scope: row.scope,
            installed_at: row.installed_at,
        })
    }
}

/// Repository for installed shops.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store (or replace) a shop's access token after OAuth.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_token(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        scope: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO share_cart.shops (shop, access_token, scope)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                updated_at = NOW()
            ",
        )
        .bind(shop.as_str())
        .bind(access_token.expose_secret())
        .bind(scope)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get an installed shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop: &ShopDomain) -> Result<Option<InstalledShop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            "SELECT shop, access_token, scope, installed_at FROM share_cart.shops WHERE shop = $1",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Forget a shop's token (on uninstall).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_token(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM share_cart.shops WHERE shop = $1")
            .bind(shop.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
