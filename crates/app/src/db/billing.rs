//! Plan catalog and shop subscription repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use share_cart_core::{
    PlanDuration, PlanId, PlanPermissions, ShopDomain, SubscriptionId, SubscriptionStatus,
};

use super::{RepositoryError, parse_shop};
use crate::models::{Plan, PlanDefinition, ShopSubscription, SubscriptionWithPlan};

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: i32,
    name: String,
    amount: Decimal,
    duration: PlanDuration,
    description: String,
    features: Vec<String>,
    permissions: Json<PlanPermissions>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: PlanId::new(row.id),
            name: row.name,
            amount: row.amount,
            duration: row.duration,
            description: row.description,
            features: row.features,
            permissions: row.permissions.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i32,
    shop: String,
    plan_id: i32,
    charge_id: Option<String>,
    status: SubscriptionStatus,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for ShopSubscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubscriptionId::new(row.id),
            shop: parse_shop(&row.shop)?,
            plan_id: PlanId::new(row.plan_id),
            charge_id: row.charge_id,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }
}

/// Outcome of upserting a catalog plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanUpsert {
    Inserted,
    Updated,
    Unchanged,
}

/// Counts of rows per table, for operational reporting.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct TableCounts {
    pub plans: i64,
    pub subscriptions: i64,
    pub coupons: i64,
    pub share_events: i64,
    pub coupon_usages: i64,
}

/// Repository for plans and subscriptions.
pub struct BillingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BillingRepository<'a> {
    /// Create a new billing repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all plans, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_plans(&self) -> Result<Vec<Plan>, RepositoryError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r"
            SELECT id, name, amount, duration, description, features, permissions
            FROM share_cart.plans
            ORDER BY amount, duration, name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_plan(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r"
            SELECT id, name, amount, duration, description, features, permissions
            FROM share_cart.plans
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a catalog plan, or update the existing plan with the same name
    /// and duration when `replace` is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_plan(
        &self,
        plan: &PlanDefinition,
        replace: bool,
    ) -> Result<PlanUpsert, RepositoryError> {
        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM share_cart.plans WHERE name = $1 AND duration = $2",
        )
        .bind(&plan.name)
        .bind(plan.duration)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some(_) if !replace => Ok(PlanUpsert::Unchanged),
            Some(id) => {
                sqlx::query(
                    r"
                    UPDATE share_cart.plans
                    SET amount = $2, description = $3, features = $4, permissions = $5,
                        updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(id)
                .bind(plan.amount)
                .bind(&plan.description)
                .bind(&plan.features)
                .bind(Json(&plan.permissions))
                .execute(self.pool)
                .await?;
                Ok(PlanUpsert::Updated)
            }
            None => {
                sqlx::query(
                    r"
                    INSERT INTO share_cart.plans (name, amount, duration, description, features, permissions)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ",
                )
                .bind(&plan.name)
                .bind(plan.amount)
                .bind(plan.duration)
                .bind(&plan.description)
                .bind(&plan.features)
                .bind(Json(&plan.permissions))
                .execute(self.pool)
                .await
                .map_err(|e| RepositoryError::from_insert(e, "plan"))?;
                Ok(PlanUpsert::Inserted)
            }
        }
    }

    /// Record a subscription for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_subscription(
        &self,
        shop: &ShopDomain,
        plan_id: PlanId,
        charge_id: Option<&str>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<ShopSubscription, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            INSERT INTO share_cart.shop_subscriptions (shop, plan_id, charge_id, status, start_date, end_date)
            VALUES ($1, $2, $3, 'ACTIVE', $4, $5)
            RETURNING id, shop, plan_id, charge_id, status, start_date, end_date, created_at
            ",
        )
        .bind(shop.as_str())
        .bind(plan_id)
        .bind(charge_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a shop's most recent subscription together with its plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the subscription's plan is missing.
    pub async fn latest_subscription(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<SubscriptionWithPlan>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT id, shop, plan_id, charge_id, status, start_date, end_date, created_at
            FROM share_cart.shop_subscriptions
            WHERE shop = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let subscription = ShopSubscription::try_from(row)?;
        let plan = self.get_plan(subscription.plan_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "subscription {} references missing plan {}",
                subscription.id, subscription.plan_id
            ))
        })?;

        Ok(Some(SubscriptionWithPlan { subscription, plan }))
    }

    /// Count rows across the app's main tables.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn table_counts(&self) -> Result<TableCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, TableCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM share_cart.plans) AS plans,
                (SELECT COUNT(*) FROM share_cart.shop_subscriptions) AS subscriptions,
                (SELECT COUNT(*) FROM share_cart.coupons) AS coupons,
                (SELECT COUNT(*) FROM share_cart.share_events) AS share_events,
                (SELECT COUNT(*) FROM share_cart.coupon_usages) AS coupon_usages
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}
