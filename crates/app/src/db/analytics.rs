//! Share event and coupon usage repository.
//!
//! Both tables are append-only, with one exception: storefront-reported
//! usages are unverified and are replaced once the signed order webhook for
//! the same order arrives. Only the webhook path claims `processed_orders`
//! and moves a coupon's `converted_count` and `revenue`, so an order is
//! counted once and only from data Shopify signed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use share_cart_core::{
    CouponId, CouponUsageId, ShareEventId, SharePlatform, ShopDomain, UserType,
};

use super::{RepositoryError, parse_shop};
use crate::models::{CouponUsage, NewCouponUsage, NewShareEvent, ShareEvent};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ShareEventRow {
    id: i32,
    shop: String,
    platform: SharePlatform,
    coupon_id: Option<i32>,
    coupon_code: Option<String>,
    cart_value: Option<Decimal>,
    customer_id: Option<String>,
    sender_email: Option<String>,
    recipient_email: Option<String>,
    device_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShareEventRow> for ShareEvent {
    type Error = RepositoryError;

    fn try_from(row: ShareEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ShareEventId::new(row.id),
            shop: parse_shop(&row.shop)?,
            platform: row.platform,
            coupon_id: row.coupon_id.map(CouponId::new),
            coupon_code: row.coupon_code,
            cart_value: row.cart_value,
            customer_id: row.customer_id,
            sender_email: row.sender_email,
            recipient_email: row.recipient_email,
            device_type: row.device_type,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponUsageRow {
    id: i32,
    shop: String,
    coupon_id: Option<i32>,
    coupon_name: String,
    coupon_code: String,
    user_type: UserType,
    order_id: Option<String>,
    order_value: Decimal,
    discount_amount: Decimal,
    customer_id: Option<String>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponUsageRow> for CouponUsage {
    type Error = RepositoryError;

    fn try_from(row: CouponUsageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CouponUsageId::new(row.id),
            shop: parse_shop(&row.shop)?,
            coupon_id: row.coupon_id.map(CouponId::new),
            coupon_name: row.coupon_name,
            coupon_code: row.coupon_code,
            user_type: row.user_type,
            order_id: row.order_id,
            order_value: row.order_value,
            discount_amount: row.discount_amount,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            verified: row.verified,
            created_at: row.created_at,
        })
    }
}

/// Which side of a coupon's shares an email address appeared on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ShareEmailMatch {
    pub as_sender: bool,
    pub as_recipient: bool,
}

const USAGE_COLUMNS: &str = r"id, shop, coupon_id, coupon_name, coupon_code, user_type, order_id,
    order_value, discount_amount, customer_id, customer_name, customer_email, verified, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for analytics events.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a share event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_share(&self, event: &NewShareEvent) -> Result<ShareEvent, RepositoryError> {
        let row = sqlx::query_as::<_, ShareEventRow>(
            r"
            INSERT INTO share_cart.share_events (
                shop, platform, coupon_id, coupon_code, cart_value, customer_id,
                sender_email, recipient_email, device_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, shop, platform, coupon_id, coupon_code, cart_value, customer_id,
                      sender_email, recipient_email, device_type, created_at
            ",
        )
        .bind(event.shop.as_str())
        .bind(event.platform)
        .bind(event.coupon_id)
        .bind(&event.coupon_code)
        .bind(event.cart_value)
        .bind(&event.customer_id)
        .bind(&event.sender_email)
        .bind(&event.recipient_email)
        .bind(&event.device_type)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Count a shop's shares since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_shares_since(
        &self,
        shop: &ShopDomain,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM share_cart.share_events WHERE shop = $1 AND created_at >= $2",
        )
        .bind(shop.as_str())
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// List a shop's share events in `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shares_between(
        &self,
        shop: &ShopDomain,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShareEvent>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShareEventRow>(
            r"
            SELECT id, shop, platform, coupon_id, coupon_code, cart_value, customer_id,
                   sender_email, recipient_email, device_type, created_at
            FROM share_cart.share_events
            WHERE shop = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at
            ",
        )
        .bind(shop.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List a shop's coupon usages in `[start, end)`, newest first.
    ///
    /// Either bound may be absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn usages_between(
        &self,
        shop: &ShopDomain,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CouponUsage>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {USAGE_COLUMNS}
            FROM share_cart.coupon_usages
            WHERE shop = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at DESC
            "
        );
        let rows = sqlx::query_as::<_, CouponUsageRow>(&sql)
            .bind(shop.as_str())
            .bind(start)
            .bind(end)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Check whether `email` shared, or was shared, the given coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn share_email_match(
        &self,
        shop: &ShopDomain,
        coupon_id: CouponId,
        email: &str,
    ) -> Result<ShareEmailMatch, RepositoryError> {
        let matched = sqlx::query_as::<_, ShareEmailMatch>(
            r"
            SELECT
                COALESCE(BOOL_OR(LOWER(sender_email) = LOWER($3)), FALSE) AS as_sender,
                COALESCE(BOOL_OR(LOWER(recipient_email) = LOWER($3)), FALSE) AS as_recipient
            FROM share_cart.share_events
            WHERE shop = $1 AND coupon_id = $2
            ",
        )
        .bind(shop.as_str())
        .bind(coupon_id)
        .bind(email.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(matched)
    }

    /// Record the verified coupon usages of one order, exactly once.
    ///
    /// Claims `(shop, order_id)`, drops any unverified storefront reports for
    /// the order, appends every usage and bumps each coupon's
    /// `converted_count` and `revenue`, all in one transaction. Returns
    /// `false` without writing anything if the order was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back and the order stays unclaimed.
    pub async fn record_order_usages(
        &self,
        shop: &ShopDomain,
        order_id: &str,
        usages: &[NewCouponUsage],
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r"
            INSERT INTO share_cart.processed_orders (shop, order_id)
            VALUES ($1, $2)
            ON CONFLICT (shop, order_id) DO NOTHING
            ",
        )
        .bind(shop.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r"
            DELETE FROM share_cart.coupon_usages
            WHERE shop = $1 AND order_id = $2 AND NOT verified
            ",
        )
        .bind(shop.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        for usage in usages {
            sqlx::query(
                r"
                INSERT INTO share_cart.coupon_usages (
                    shop, coupon_id, coupon_name, coupon_code, user_type, order_id,
                    order_value, discount_amount, customer_id, customer_name, customer_email,
                    verified
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE)
                ",
            )
            .bind(usage.shop.as_str())
            .bind(usage.coupon_id)
            .bind(&usage.coupon_name)
            .bind(&usage.coupon_code)
            .bind(usage.user_type)
            .bind(&usage.order_id)
            .bind(usage.order_value)
            .bind(usage.discount_amount)
            .bind(&usage.customer_id)
            .bind(&usage.customer_name)
            .bind(&usage.customer_email)
            .execute(&mut *tx)
            .await?;

            if let Some(coupon_id) = usage.coupon_id {
                sqlx::query(
                    r"
                    UPDATE share_cart.coupons
                    SET converted_count = converted_count + 1,
                        revenue = revenue + $3,
                        updated_at = NOW()
                    WHERE shop = $1 AND id = $2
                    ",
                )
                .bind(shop.as_str())
                .bind(coupon_id)
                .bind(usage.order_value)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Record an unverified usage reported from the storefront.
    ///
    /// The row is informational: it takes no order claim and leaves the
    /// coupon's counters alone. Returns `false` without writing when the
    /// order was already reconciled from its webhook, or the same code was
    /// already reported for it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_usage(&self, usage: &NewCouponUsage) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            r"
            INSERT INTO share_cart.coupon_usages (
                shop, coupon_id, coupon_name, coupon_code, user_type, order_id,
                order_value, discount_amount, customer_id, customer_name, customer_email,
                verified
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE
            WHERE $6::text IS NULL OR NOT (
                EXISTS (
                    SELECT 1 FROM share_cart.processed_orders
                    WHERE shop = $1 AND order_id = $6
                )
                OR EXISTS (
                    SELECT 1 FROM share_cart.coupon_usages
                    WHERE shop = $1 AND order_id = $6 AND UPPER(coupon_code) = UPPER($4)
                )
            )
            ",
        )
        .bind(usage.shop.as_str())
        .bind(usage.coupon_id)
        .bind(&usage.coupon_name)
        .bind(&usage.coupon_code)
        .bind(usage.user_type)
        .bind(&usage.order_id)
        .bind(usage.order_value)
        .bind(usage.discount_amount)
        .bind(&usage.customer_id)
        .bind(&usage.customer_name)
        .bind(&usage.customer_email)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }
}
