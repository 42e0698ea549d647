//! Plan catalog and shop subscription models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use share_cart_core::{PlanDuration, PlanId, PlanPermissions, ShopDomain, SubscriptionId, SubscriptionStatus};

/// A billing plan offered to merchants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Price per period in USD. Zero means the free plan.
    pub amount: Decimal,
    pub duration: PlanDuration,
    pub description: String,
    pub features: Vec<String>,
    pub permissions: PlanPermissions,
}

impl Plan {
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }
}

/// A shop's subscription to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSubscription {
    pub id: SubscriptionId,
    pub shop: ShopDomain,
    pub plan_id: PlanId,
    /// Shopify `AppSubscription` charge id, absent for free plans.
    pub charge_id: Option<String>,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ShopSubscription {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status != SubscriptionStatus::Active || self.end_date < now
    }
}

/// A subscription joined with its plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithPlan {
    #[serde(flatten)]
    pub subscription: ShopSubscription,
    pub plan: Plan,
}

/// A plan definition as loaded from a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDefinition {
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub duration: PlanDuration,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub permissions: PlanPermissions,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn subscription(status: SubscriptionStatus, end_date: DateTime<Utc>) -> ShopSubscription {
        ShopSubscription {
            id: SubscriptionId::new(1),
            shop: ShopDomain::parse("store.myshopify.com").unwrap(),
            plan_id: PlanId::new(1),
            charge_id: None,
            status,
            start_date: end_date - Duration::days(30),
            end_date,
            created_at: end_date - Duration::days(30),
        }
    }

    #[test]
    fn test_subscription_expiry() {
        let now = Utc::now();
        assert!(!subscription(SubscriptionStatus::Active, now + Duration::days(1)).is_expired(now));
        assert!(subscription(SubscriptionStatus::Active, now - Duration::days(1)).is_expired(now));
        assert!(subscription(SubscriptionStatus::Cancelled, now + Duration::days(1)).is_expired(now));
    }
}
