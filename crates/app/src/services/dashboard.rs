//! Dashboard aggregation over fetched share and usage events.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use share_cart_core::{SharePlatform, Timeframe, UserType};

use crate::models::{CouponUsage, ShareEvent};

/// Revenue split by who redeemed the coupon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevenueByUserType {
    pub sender: Decimal,
    pub recipient: Decimal,
}

/// Share counts per platform. Every platform is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SharesByPlatform {
    pub whatsapp: u64,
    pub messenger: u64,
    pub email: u64,
}

/// Event count for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// Dashboard figures for one reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub timeframe: Timeframe,
    pub shares: u64,
    pub coupons_used: u64,
    /// Total revenue with two decimal places.
    pub revenue: String,
    pub revenue_by_user_type: RevenueByUserType,
    pub shares_by_platform: SharesByPlatform,
    pub daily_shares: Vec<DailyCount>,
    pub daily_purchases: Vec<DailyCount>,
}

fn daily<I>(dates: I) -> Vec<DailyCount>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in dates {
        *days.entry(date).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Aggregate the events of a window into dashboard figures.
#[must_use]
pub fn aggregate(timeframe: Timeframe, shares: &[ShareEvent], usages: &[CouponUsage]) -> DashboardData {
    let mut by_platform = SharesByPlatform::default();
    for share in shares {
        match share.platform {
            SharePlatform::Whatsapp => by_platform.whatsapp += 1,
            SharePlatform::Messenger => by_platform.messenger += 1,
            SharePlatform::Email => by_platform.email += 1,
        }
    }

    // Unverified storefront reports carry client-supplied amounts
    let mut revenue = RevenueByUserType::default();
    for usage in usages.iter().filter(|u| u.verified) {
        match usage.user_type {
            UserType::Sender => revenue.sender += usage.order_value,
            UserType::Recipient => revenue.recipient += usage.order_value,
        }
    }
    let total = (revenue.sender + revenue.recipient).round_dp(2);

    DashboardData {
        timeframe,
        shares: shares.len() as u64,
        coupons_used: usages.len() as u64,
        revenue: format!("{total:.2}"),
        revenue_by_user_type: revenue,
        shares_by_platform: by_platform,
        daily_shares: daily(shares.iter().map(|s| s.created_at.date_naive())),
        daily_purchases: daily(usages.iter().map(|u| u.created_at.date_naive())),
    }
}
