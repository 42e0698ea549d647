//! Widget settings repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use share_cart_core::{ButtonStyle, CouponId, ShopDomain, WidgetColors, WidgetPlacement};

use super::{RepositoryError, parse_shop};
use crate::models::{SaveWidgetRequest, Widget};

#[derive(Debug, sqlx::FromRow)]
struct WidgetRow {
    shop: String,
    display: Vec<String>,
    button_style: String,
    text: String,
    colors: Json<WidgetColors>,
    coupon_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WidgetRow> for Widget {
    type Error = RepositoryError;

    fn try_from(row: WidgetRow) -> Result<Self, Self::Error> {
        let display = row
            .display
            .iter()
            .map(|p| p.parse::<WidgetPlacement>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::DataCorruption)?;
        let button_style = row
            .button_style
            .parse::<ButtonStyle>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            shop: parse_shop(&row.shop)?,
            display,
            button_style,
            text: row.text,
            colors: row.colors.0,
            coupon_id: row.coupon_id.map(CouponId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const WIDGET_COLUMNS: &str =
    "shop, display, button_style, text, colors, coupon_id, created_at, updated_at";

/// Repository for widget settings.
pub struct WidgetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WidgetRepository<'a> {
    /// Create a new widget repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a shop's widget settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn get(&self, shop: &ShopDomain) -> Result<Option<Widget>, RepositoryError> {
        let sql = format!("SELECT {WIDGET_COLUMNS} FROM share_cart.widgets WHERE shop = $1");
        let row = sqlx::query_as::<_, WidgetRow>(&sql)
            .bind(shop.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create or replace a shop's widget settings, keeping the linked coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        settings: &SaveWidgetRequest,
    ) -> Result<Widget, RepositoryError> {
        let display: Vec<String> = settings
            .display
            .iter()
            .map(|p| p.as_str().to_owned())
            .collect();
        let sql = format!(
            r"
            INSERT INTO share_cart.widgets (shop, display, button_style, text, colors)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (shop) DO UPDATE
            SET display = EXCLUDED.display,
                button_style = EXCLUDED.button_style,
                text = EXCLUDED.text,
                colors = EXCLUDED.colors,
                updated_at = NOW()
            RETURNING {WIDGET_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, WidgetRow>(&sql)
            .bind(shop.as_str())
            .bind(&display)
            .bind(settings.button_style.as_str())
            .bind(&settings.text)
            .bind(Json(&settings.colors))
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Point the widget at a coupon, creating default settings if none exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn link_coupon(
        &self,
        shop: &ShopDomain,
        coupon_id: CouponId,
    ) -> Result<Widget, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO share_cart.widgets (shop, coupon_id)
            VALUES ($1, $2)
            ON CONFLICT (shop) DO UPDATE
            SET coupon_id = EXCLUDED.coupon_id, updated_at = NOW()
            RETURNING {WIDGET_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, WidgetRow>(&sql)
            .bind(shop.as_str())
            .bind(coupon_id)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Unlink the widget from a coupon if it currently points at it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn unlink_coupon(
        &self,
        shop: &ShopDomain,
        coupon_id: CouponId,
    ) -> Result<Option<Widget>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE share_cart.widgets SET coupon_id = NULL, updated_at = NOW()
            WHERE shop = $1 AND coupon_id = $2
            RETURNING {WIDGET_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, WidgetRow>(&sql)
            .bind(shop.as_str())
            .bind(coupon_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }
}
