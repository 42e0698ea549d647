//! Billing plan types and plan permission limits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Billing interval of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "share_cart.plan_duration", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PlanDuration {
    #[default]
    Monthly,
    Yearly,
}

impl PlanDuration {
    /// Length of one billing period in days.
    #[must_use]
    pub const fn length_days(self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }

    /// Shopify `AppPricingInterval` for recurring charges.
    #[must_use]
    pub const fn shopify_interval(self) -> &'static str {
        match self {
            Self::Monthly => "EVERY_30_DAYS",
            Self::Yearly => "ANNUAL",
        }
    }
}

/// Lifecycle state of a shop's subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(
        type_name = "share_cart.subscription_status",
        rename_all = "SCREAMING_SNAKE_CASE"
    )
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Expired,
}

/// A numeric plan allowance that may be unlimited.
///
/// Serialized as a plain number or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Limit {
    Limited(u32),
    #[default]
    Unlimited,
}

impl Limit {
    /// Whether one more item may be added when `current` already exist.
    #[must_use]
    pub const fn allows(self, current: u64) -> bool {
        match self {
            Self::Limited(max) => current < max as u64,
            Self::Unlimited => true,
        }
    }

    /// Whether `count` items in total fit in the allowance.
    #[must_use]
    pub const fn permits_total(self, count: u64) -> bool {
        match self {
            Self::Limited(max) => count <= max as u64,
            Self::Unlimited => true,
        }
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(n) => serializer.serialize_u32(*n),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Limited(n)),
            Raw::Text(s) if s.eq_ignore_ascii_case("unlimited") => Ok(Self::Unlimited),
            Raw::Text(s) => s
                .trim()
                .parse::<u32>()
                .map(Self::Limited)
                .map_err(|_| serde::de::Error::custom(format!("invalid limit: {s}"))),
        }
    }
}

/// Feature allowances granted by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlanPermissions {
    /// Number of widget placements the shop may enable.
    #[serde(default)]
    pub widget: Limit,
    /// Cart shares allowed per billing period.
    #[serde(default)]
    pub cart_shares: Limit,
    /// Coupons that may be active at once.
    #[serde(default)]
    pub live_coupons: Limit,
    #[serde(default)]
    pub live_chat: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_allows() {
        assert!(Limit::Limited(5).allows(4));
        assert!(!Limit::Limited(5).allows(5));
        assert!(!Limit::Limited(0).allows(0));
        assert!(Limit::Unlimited.allows(u64::MAX));
    }

    #[test]
    fn test_limit_permits_total() {
        assert!(Limit::Limited(2).permits_total(2));
        assert!(!Limit::Limited(2).permits_total(3));
        assert!(Limit::Unlimited.permits_total(100));
    }

    #[test]
    fn test_limit_serde() {
        assert_eq!(serde_json::to_string(&Limit::Limited(4)).unwrap(), "4");
        assert_eq!(
            serde_json::to_string(&Limit::Unlimited).unwrap(),
            "\"unlimited\""
        );
        assert_eq!(
            serde_json::from_str::<Limit>("\"Unlimited\"").unwrap(),
            Limit::Unlimited
        );
        assert_eq!(
            serde_json::from_str::<Limit>("\"15\"").unwrap(),
            Limit::Limited(15)
        );
        assert!(serde_json::from_str::<Limit>("\"lots\"").is_err());
    }

    #[test]
    fn test_permissions_from_catalog_json() {
        let json = r#"{"widget":4,"cartShares":"unlimited","liveCoupons":5,"liveChat":true}"#;
        let perms: PlanPermissions = serde_json::from_str(json).unwrap();
        assert_eq!(perms.widget, Limit::Limited(4));
        assert_eq!(perms.cart_shares, Limit::Unlimited);
        assert_eq!(perms.live_coupons, Limit::Limited(5));
        assert!(perms.live_chat);
    }

    #[test]
    fn test_duration_lengths() {
        assert_eq!(PlanDuration::Monthly.length_days(), 30);
        assert_eq!(PlanDuration::Yearly.length_days(), 365);
        assert_eq!(PlanDuration::Yearly.shopify_interval(), "ANNUAL");
    }
}
