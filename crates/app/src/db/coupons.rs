//! Coupon repository.
//!
//! Every query is scoped by shop. Activation runs in a transaction so a
//! shop never ends up with two active coupons; the partial unique index
//! `coupons_one_active_idx` backs this at the schema level.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use share_cart_core::{CouponId, DiscountKind, ShopDomain};

use super::{RepositoryError, parse_shop};
use crate::models::{Coupon, CouponSummary, NewCoupon};

macro_rules! coupon_columns {
    () => {
        r"id, shop, name, code, discount_type, percentage_value, fixed_amount,
          sender_require_min_purchase, sender_min_purchase_amount, sender_times_per_user,
          sender_times_value, sender_new_customers_only,
          recipient_require_min_purchase, recipient_min_purchase_amount, recipient_times_per_user,
          recipient_times_value, recipient_new_customers_only,
          share_whatsapp, share_messenger, share_email,
          product_id, product_type, product_ids, collection_ids, shopify_discount_id, custom_message,
          sent_count, converted_count, click_count, revenue,
          start_date, end_date, is_active, created_at, updated_at"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    shop: String,
    name: String,
    code: String,
    discount_type: DiscountKind,
    percentage_value: Option<Decimal>,
    fixed_amount: Option<Decimal>,
    sender_require_min_purchase: bool,
    sender_min_purchase_amount: Option<Decimal>,
    sender_times_per_user: bool,
    sender_times_value: Option<i32>,
    sender_new_customers_only: bool,
    recipient_require_min_purchase: bool,
    recipient_min_purchase_amount: Option<Decimal>,
    recipient_times_per_user: bool,
    recipient_times_value: Option<i32>,
    recipient_new_customers_only: bool,
    share_whatsapp: bool,
    share_messenger: bool,
    share_email: bool,
    product_id: Option<String>,
    product_type: Option<String>,
    product_ids: Vec<String>,
    collection_ids: Vec<String>,
    shopify_discount_id: Option<String>,
    custom_message: Option<String>,
    sent_count: i32,
    converted_count: i32,
    click_count: i32,
    revenue: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CouponId::new(row.id),
            shop: parse_shop(&row.shop)?,
            name: row.name,
            code: row.code,
            discount_type: row.discount_type,
            percentage_value: row.percentage_value,
            fixed_amount: row.fixed_amount,
            sender_require_min_purchase: row.sender_require_min_purchase,
            sender_min_purchase_amount: row.sender_min_purchase_amount,
            sender_times_per_user: row.sender_times_per_user,
            sender_times_value: row.sender_times_value,
            sender_new_customers_only: row.sender_new_customers_only,
            recipient_require_min_purchase: row.recipient_require_min_purchase,
            recipient_min_purchase_amount: row.recipient_min_purchase_amount,
            recipient_times_per_user: row.recipient_times_per_user,
            recipient_times_value: row.recipient_times_value,
            recipient_new_customers_only: row.recipient_new_customers_only,
            share_whatsapp: row.share_whatsapp,
            share_messenger: row.share_messenger,
            share_email: row.share_email,
            product_id: row.product_id,
            product_type: row.product_type,
            product_ids: row.product_ids,
            collection_ids: row.collection_ids,
            shopify_discount_id: row.shopify_discount_id,
            custom_message: row.custom_message,
            sent_count: row.sent_count,
            converted_count: row.converted_count,
            click_count: row.click_count,
            revenue: row.revenue,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponSummaryRow {
    id: i32,
    name: String,
    code: String,
    created_at: DateTime<Utc>,
    end_date: DateTime<Utc>,
    sent_count: i32,
    converted_count: i32,
    used_by: String,
    is_active: bool,
}

impl From<CouponSummaryRow> for CouponSummary {
    fn from(row: CouponSummaryRow) -> Self {
        Self {
            id: CouponId::new(row.id),
            name: row.name,
            code: row.code,
            created_at: row.created_at,
            end_date: row.end_date,
            sent_count: row.sent_count,
            converted_count: row.converted_count,
            used_by: row.used_by,
            is_active: row.is_active,
        }
    }
}

/// Result of activating a coupon.
#[derive(Debug)]
pub struct Activation {
    /// The coupon that is now active.
    pub activated: Coupon,
    /// Coupons that were active before and are now inactive.
    pub deactivated: Vec<Coupon>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a shop's coupons, newest first, with the names of redeeming customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, shop: &ShopDomain) -> Result<Vec<CouponSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponSummaryRow>(
            r"
            SELECT c.id, c.name, c.code, c.created_at, c.end_date,
                   c.sent_count, c.converted_count, c.is_active,
                   COALESCE(
                       STRING_AGG(u.customer_name, ', ' ORDER BY u.created_at)
                           FILTER (WHERE u.customer_name IS NOT NULL),
                       ''
                   ) AS used_by
            FROM share_cart.coupons c
            LEFT JOIN share_cart.coupon_usages u ON u.coupon_id = c.id
            WHERE c.shop = $1
            GROUP BY c.id
            ORDER BY c.created_at DESC
            ",
        )
        .bind(shop.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a coupon by ID within a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        shop: &ShopDomain,
        id: CouponId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            "SELECT ",
            coupon_columns!(),
            " FROM share_cart.coupons WHERE shop = $1 AND id = $2"
        ))
        .bind(shop.as_str())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find a coupon by code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            "SELECT ",
            coupon_columns!(),
            " FROM share_cart.coupons WHERE shop = $1 AND UPPER(code) = UPPER($2)"
        ))
        .bind(shop.as_str())
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Count the shop's active coupons.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM share_cart.coupons WHERE shop = $1 AND is_active",
        )
        .bind(shop.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Insert a new, inactive coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already used in the shop.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            r"
            INSERT INTO share_cart.coupons (
                shop, name, code, discount_type, percentage_value, fixed_amount,
                sender_require_min_purchase, sender_min_purchase_amount, sender_times_per_user,
                sender_times_value, sender_new_customers_only,
                recipient_require_min_purchase, recipient_min_purchase_amount,
                recipient_times_per_user, recipient_times_value, recipient_new_customers_only,
                share_whatsapp, share_messenger, share_email,
                product_id, product_type, product_ids, collection_ids,
                shopify_discount_id, custom_message, start_date, end_date, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, FALSE)
            RETURNING ",
            coupon_columns!()
        ))
        .bind(coupon.shop.as_str())
        .bind(&coupon.name)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.percentage_value)
        .bind(coupon.fixed_amount)
        .bind(coupon.sender_require_min_purchase)
        .bind(coupon.sender_min_purchase_amount)
        .bind(coupon.sender_times_per_user)
        .bind(coupon.sender_times_value)
        .bind(coupon.sender_new_customers_only)
        .bind(coupon.recipient_require_min_purchase)
        .bind(coupon.recipient_min_purchase_amount)
        .bind(coupon.recipient_times_per_user)
        .bind(coupon.recipient_times_value)
        .bind(coupon.recipient_new_customers_only)
        .bind(coupon.share_whatsapp)
        .bind(coupon.share_messenger)
        .bind(coupon.share_email)
        .bind(&coupon.product_id)
        .bind(&coupon.product_type)
        .bind(&coupon.product_ids)
        .bind(&coupon.collection_ids)
        .bind(&coupon.shopify_discount_id)
        .bind(&coupon.custom_message)
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "coupon code"))?;

        row.try_into()
    }

    /// Persist every editable field of a coupon. Activation is not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon no longer exists.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, coupon: &Coupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            r"
            UPDATE share_cart.coupons SET
                name = $3, discount_type = $4, percentage_value = $5, fixed_amount = $6,
                sender_require_min_purchase = $7, sender_min_purchase_amount = $8,
                sender_times_per_user = $9, sender_times_value = $10,
                sender_new_customers_only = $11,
                recipient_require_min_purchase = $12, recipient_min_purchase_amount = $13,
                recipient_times_per_user = $14, recipient_times_value = $15,
                recipient_new_customers_only = $16,
                share_whatsapp = $17, share_messenger = $18, share_email = $19,
                product_id = $20, product_type = $21, product_ids = $22, collection_ids = $23,
                custom_message = $24, start_date = $25, end_date = $26,
                updated_at = NOW()
            WHERE shop = $1 AND id = $2
            RETURNING ",
            coupon_columns!()
        ))
        .bind(coupon.shop.as_str())
        .bind(coupon.id)
        .bind(&coupon.name)
        .bind(coupon.discount_type)
        .bind(coupon.percentage_value)
        .bind(coupon.fixed_amount)
        .bind(coupon.sender_require_min_purchase)
        .bind(coupon.sender_min_purchase_amount)
        .bind(coupon.sender_times_per_user)
        .bind(coupon.sender_times_value)
        .bind(coupon.sender_new_customers_only)
        .bind(coupon.recipient_require_min_purchase)
        .bind(coupon.recipient_min_purchase_amount)
        .bind(coupon.recipient_times_per_user)
        .bind(coupon.recipient_times_value)
        .bind(coupon.recipient_new_customers_only)
        .bind(coupon.share_whatsapp)
        .bind(coupon.share_messenger)
        .bind(coupon.share_email)
        .bind(&coupon.product_id)
        .bind(&coupon.product_type)
        .bind(&coupon.product_ids)
        .bind(&coupon.collection_ids)
        .bind(&coupon.custom_message)
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a coupon, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(
        &self,
        shop: &ShopDomain,
        id: CouponId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            "DELETE FROM share_cart.coupons WHERE shop = $1 AND id = $2 RETURNING ",
            coupon_columns!()
        ))
        .bind(shop.as_str())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Make `id` the shop's only active coupon.
    ///
    /// Returns `None` without changing anything if the coupon does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    pub async fn activate(
        &self,
        shop: &ShopDomain,
        id: CouponId,
    ) -> Result<Option<Activation>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the shop's coupons so concurrent activations serialize
        let previously_active = sqlx::query_as::<_, CouponRow>(concat!(
            "SELECT ",
            coupon_columns!(),
            " FROM share_cart.coupons WHERE shop = $1 AND is_active AND id <> $2 FOR UPDATE"
        ))
        .bind(shop.as_str())
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE share_cart.coupons SET is_active = FALSE, updated_at = NOW()
            WHERE shop = $1 AND is_active AND id <> $2
            ",
        )
        .bind(shop.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let activated = sqlx::query_as::<_, CouponRow>(concat!(
            r"
            UPDATE share_cart.coupons SET is_active = TRUE, updated_at = NOW()
            WHERE shop = $1 AND id = $2
            RETURNING ",
            coupon_columns!()
        ))
        .bind(shop.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(activated) = activated else {
            tx.rollback().await?;
            return Ok(None);
        };

        tx.commit().await?;

        let deactivated = previously_active
            .into_iter()
            .map(|row| {
                let mut coupon = Coupon::try_from(row)?;
                coupon.is_active = false;
                Ok(coupon)
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(Activation {
            activated: activated.try_into()?,
            deactivated,
        }))
    }

    /// Clear a coupon's active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn deactivate(
        &self,
        shop: &ShopDomain,
        id: CouponId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(concat!(
            r"
            UPDATE share_cart.coupons SET is_active = FALSE, updated_at = NOW()
            WHERE shop = $1 AND id = $2
            RETURNING ",
            coupon_columns!()
        ))
        .bind(shop.as_str())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Increment the click counter of the coupon with `code`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon in the shop has that code.
    pub async fn record_click(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<CouponId, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE share_cart.coupons SET click_count = click_count + 1
            WHERE shop = $1 AND UPPER(code) = UPPER($2)
            RETURNING id
            ",
        )
        .bind(shop.as_str())
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        id.map(CouponId::new).ok_or(RepositoryError::NotFound)
    }

    /// Increment the sent counter of the coupon with `code`, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_sent(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<Option<CouponId>, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE share_cart.coupons SET sent_count = sent_count + 1
            WHERE shop = $1 AND UPPER(code) = UPPER($2)
            RETURNING id
            ",
        )
        .bind(shop.as_str())
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map(CouponId::new))
    }
}
