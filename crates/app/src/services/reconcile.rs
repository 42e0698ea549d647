//! Order reconciliation: turning order webhooks into coupon usages.
//!
//! Planning (which codes count, who redeemed them, what gets recorded) is
//! pure. Recording goes through [`AnalyticsRepository::record_order_usages`],
//! which claims the order id so each order is counted once whichever topic
//! or storefront call delivers it first.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use share_cart_core::{ShopDomain, UserType};

use crate::db::analytics::ShareEmailMatch;
use crate::db::{AnalyticsRepository, CouponRepository, RepositoryError};
use crate::models::{Coupon, NewCouponUsage};

/// Name recorded when an order has no customer name.
pub const GUEST_NAME: &str = "Guest";

/// Shopify ids arrive as numbers in webhooks and as strings elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The parts of an order webhook payload reconciliation reads.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPayload {
    pub id: IdValue,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub total_discounts: Option<Decimal>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeLine>,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeLine {
    pub code: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub orders_count: Option<u64>,
}

impl OrderPayload {
    /// Parse a webhook body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the body is not an order.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The email the order was placed with.
    #[must_use]
    pub fn buyer_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or_else(|| self.customer.as_ref().and_then(|c| c.email.as_deref()))
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Customer display name, or [`GUEST_NAME`].
    #[must_use]
    pub fn customer_name(&self) -> String {
        let name = self.customer.as_ref().map_or_else(String::new, |c| {
            [c.first_name.as_deref(), c.last_name.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        });
        if name.is_empty() {
            GUEST_NAME.to_string()
        } else {
            name
        }
    }

    /// Distinct discount codes, upper-cased, in order of appearance.
    #[must_use]
    pub fn distinct_codes(&self) -> Vec<&DiscountCodeLine> {
        let mut seen: Vec<String> = Vec::new();
        let mut lines = Vec::new();
        for line in &self.discount_codes {
            let code = line.code.trim().to_uppercase();
            if code.is_empty() || seen.contains(&code) {
                continue;
            }
            seen.push(code);
            lines.push(line);
        }
        lines
    }
}

/// Decide whether the buyer redeemed the coupon as sender or recipient.
///
/// A share naming the buyer's email wins; otherwise first-time customers are
/// taken to be recipients of a shared cart.
#[must_use]
pub fn classify(share_match: ShareEmailMatch, customer: Option<&OrderCustomer>) -> UserType {
    if share_match.as_sender {
        return UserType::Sender;
    }
    if share_match.as_recipient {
        return UserType::Recipient;
    }
    match customer.and_then(|c| c.orders_count) {
        Some(count) if count <= 1 => UserType::Recipient,
        _ => UserType::Sender,
    }
}

/// The usage recorded for one coupon code of an order.
#[must_use]
pub fn usage_for(
    shop: &ShopDomain,
    order: &OrderPayload,
    line: &DiscountCodeLine,
    coupon: &Coupon,
    user_type: UserType,
) -> NewCouponUsage {
    NewCouponUsage {
        shop: shop.clone(),
        coupon_id: Some(coupon.id),
        coupon_name: coupon.name.clone(),
        coupon_code: coupon.code.clone(),
        user_type,
        order_id: Some(order.id.to_string()),
        order_value: order.total_price.unwrap_or_default(),
        discount_amount: line
            .amount
            .or(order.total_discounts)
            .unwrap_or_default(),
        customer_id: order
            .customer
            .as_ref()
            .and_then(|c| c.id.as_ref())
            .map(ToString::to_string),
        customer_name: Some(order.customer_name()),
        customer_email: order.buyer_email().map(str::to_string),
    }
}

/// What reconciling an order did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No discount code on the order matches a coupon.
    NoCoupons,
    /// The order was counted before.
    AlreadyProcessed,
    /// This many usages were recorded.
    Recorded(usize),
}

/// Record the coupon usages of an order, once per order id.
///
/// # Errors
///
/// Returns `RepositoryError` if a lookup or the recording transaction fails.
#[instrument(skip(pool, order), fields(shop = %shop, order_id = %order.id))]
pub async fn reconcile_order(
    pool: &PgPool,
    shop: &ShopDomain,
    order: &OrderPayload,
) -> Result<ReconcileOutcome, RepositoryError> {
    let coupons = CouponRepository::new(pool);
    let analytics = AnalyticsRepository::new(pool);

    let mut usages = Vec::new();
    for line in order.distinct_codes() {
        let Some(coupon) = coupons.find_by_code(shop, line.code.trim()).await? else {
            debug!(code = %line.code, "Discount code is not a Share Cart coupon");
            continue;
        };

        let share_match = match order.buyer_email() {
            Some(email) => analytics.share_email_match(shop, coupon.id, email).await?,
            None => ShareEmailMatch::default(),
        };
        let user_type = classify(share_match, order.customer.as_ref());
        usages.push(usage_for(shop, order, line, &coupon, user_type));
    }

    if usages.is_empty() {
        return Ok(ReconcileOutcome::NoCoupons);
    }

    let order_id = order.id.to_string();
    if analytics
        .record_order_usages(shop, &order_id, &usages)
        .await?
    {
        info!(usages = usages.len(), "Order reconciled");
        Ok(ReconcileOutcome::Recorded(usages.len()))
    } else {
        debug!("Order already reconciled");
        Ok(ReconcileOutcome::AlreadyProcessed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn order(value: serde_json::Value) -> OrderPayload {
        serde_json::from_value(value).unwrap()
    }

    fn customer(orders_count: Option<u64>) -> OrderCustomer {
        OrderCustomer {
            id: Some(IdValue::Number(7)),
            email: None,
            first_name: None,
            last_name: None,
            orders_count,
        }
    }

    #[test]
    fn test_parse_webhook_payload() {
        let order = order(json!({
            "id": 820_982_911_946_154_508_i64,
            "email": "jane@example.com",
            "total_price": "120.00",
            "total_discounts": "12.00",
            "discount_codes": [{ "code": "sum1234", "amount": "12.00", "type": "percentage" }],
            "customer": { "id": 115_310_627_314_723_954_i64, "first_name": "Jane", "last_name": "Doe", "orders_count": 1 },
            "line_items": []
        }));
        assert_eq!(order.id.to_string(), "820982911946154508");
        assert_eq!(order.total_price, Some(Decimal::from_str("120.00").unwrap()));
        assert_eq!(order.customer_name(), "Jane Doe");
        assert_eq!(order.buyer_email(), Some("jane@example.com"));
    }

    #[test]
    fn test_customer_name_falls_back_to_guest() {
        assert_eq!(order(json!({ "id": 1 })).customer_name(), GUEST_NAME);
        assert_eq!(
            order(json!({ "id": 1, "customer": { "first_name": " ", "last_name": null } }))
                .customer_name(),
            GUEST_NAME
        );
    }

    #[test]
    fn test_distinct_codes_dedupes_case_insensitively() {
        let order = order(json!({
            "id": "1",
            "discount_codes": [
                { "code": "ABC1234" },
                { "code": "abc1234" },
                { "code": "" },
                { "code": "XYZ9999" }
            ]
        }));
        let codes: Vec<&str> = order.distinct_codes().iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["ABC1234", "XYZ9999"]);
    }

    #[test]
    fn test_classify_prefers_share_emails() {
        let sender = ShareEmailMatch {
            as_sender: true,
            as_recipient: true,
        };
        assert_eq!(classify(sender, Some(&customer(Some(1)))), UserType::Sender);

        let recipient = ShareEmailMatch {
            as_sender: false,
            as_recipient: true,
        };
        assert_eq!(classify(recipient, Some(&customer(Some(10)))), UserType::Recipient);
    }

    #[test]
    fn test_classify_by_order_history() {
        let none = ShareEmailMatch::default();
        assert_eq!(classify(none, Some(&customer(Some(0)))), UserType::Recipient);
        assert_eq!(classify(none, Some(&customer(Some(1)))), UserType::Recipient);
        assert_eq!(classify(none, Some(&customer(Some(2)))), UserType::Sender);
        assert_eq!(classify(none, Some(&customer(None))), UserType::Sender);
        assert_eq!(classify(none, None), UserType::Sender);
    }
}
