//! GDPR data requests and redaction.

use sqlx::PgPool;

use share_cart_core::ShopDomain;

use super::RepositoryError;

/// A customer as identified in Shopify's privacy webhooks.
#[derive(Debug, Clone, Default)]
pub struct CustomerRef {
    pub customer_id: Option<String>,
    pub email: Option<String>,
}

/// Number of records held about a customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerRecordCounts {
    pub share_events: u64,
    pub coupon_usages: u64,
}

/// Repository for privacy compliance operations.
pub struct PrivacyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PrivacyRepository<'a> {
    /// Create a new privacy repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the records stored about a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn count_customer_records(
        &self,
        shop: &ShopDomain,
        customer: &CustomerRef,
    ) -> Result<CustomerRecordCounts, RepositoryError> {
        let share_events: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM share_cart.share_events
            WHERE shop = $1
              AND (customer_id = $2
                   OR LOWER(sender_email) = LOWER($3)
                   OR LOWER(recipient_email) = LOWER($3))
            ",
        )
        .bind(shop.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.email)
        .fetch_one(self.pool)
        .await?;

        let coupon_usages: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM share_cart.coupon_usages
            WHERE shop = $1 AND (customer_id = $2 OR LOWER(customer_email) = LOWER($3))
            ",
        )
        .bind(shop.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.email)
        .fetch_one(self.pool)
        .await?;

        Ok(CustomerRecordCounts {
            share_events: u64::try_from(share_events).unwrap_or_default(),
            coupon_usages: u64::try_from(coupon_usages).unwrap_or_default(),
        })
    }

    /// Strip a customer's personal data from stored events.
    ///
    /// Aggregates stay intact: events are anonymized, not deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn redact_customer(
        &self,
        shop: &ShopDomain,
        customer: &CustomerRef,
    ) -> Result<CustomerRecordCounts, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let usages = sqlx::query(
            r"
            UPDATE share_cart.coupon_usages
            SET customer_id = NULL, customer_name = NULL, customer_email = NULL
            WHERE shop = $1 AND (customer_id = $2 OR LOWER(customer_email) = LOWER($3))
            ",
        )
        .bind(shop.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let shares = sqlx::query(
            r"
            UPDATE share_cart.share_events
            SET customer_id = CASE WHEN customer_id = $2 THEN NULL ELSE customer_id END,
                sender_email = CASE WHEN LOWER(sender_email) = LOWER($3) THEN NULL ELSE sender_email END,
                recipient_email = CASE WHEN LOWER(recipient_email) = LOWER($3) THEN NULL ELSE recipient_email END
            WHERE shop = $1
              AND (customer_id = $2
                   OR LOWER(sender_email) = LOWER($3)
                   OR LOWER(recipient_email) = LOWER($3))
            ",
        )
        .bind(shop.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(CustomerRecordCounts {
            share_events: shares,
            coupon_usages: usages,
        })
    }

    /// Delete everything stored for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails; nothing is
    /// deleted in that case.
    pub async fn redact_shop(&self, shop: &ShopDomain) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "share_cart.widgets",
            "share_cart.coupon_usages",
            "share_cart.share_events",
            "share_cart.processed_orders",
            "share_cart.coupons",
            "share_cart.shop_subscriptions",
            "share_cart.shops",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE shop = $1"))
                .bind(shop.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
