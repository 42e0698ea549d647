//! GraphQL operations against the Shopify Admin API.
//!
//! Each operation is a unit struct implementing `graphql_client::GraphQLQuery`
//! with a module holding its `Variables` and `ResponseData`. The documents
//! live in `src/shopify/graphql/`.

use chrono::{DateTime, Utc};
use graphql_client::{GraphQLQuery, QueryBody};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UserError;

macro_rules! operation {
    ($name:ident, $module:ident) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

const DISCOUNTS: &str = include_str!("graphql/discounts.graphql");
const SHOP: &str = include_str!("graphql/shop.graphql");
const CATALOG: &str = include_str!("graphql/catalog.graphql");
const BILLING: &str = include_str!("graphql/billing.graphql");
const WEBHOOKS: &str = include_str!("graphql/webhooks.graphql");

// =============================================================================
// Shared input and payload types
// =============================================================================

/// `DiscountCodeBasicInput`. Unset fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeBasicInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_selection: Option<DiscountCustomerSelectionInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_gets: Option<DiscountCustomerGetsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_once_per_customer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_requirement: Option<DiscountMinimumRequirementInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountCustomerSelectionInput {
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountCustomerGetsInput {
    pub value: DiscountCustomerGetsValueInput,
    pub items: DiscountItemsInput,
}

/// Exactly one of `percentage` or `discount_amount` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCustomerGetsValueInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<DiscountAmountInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountAmountInput {
    pub amount: Decimal,
    pub applies_on_each_item: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscountItemsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<DiscountProductsInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<DiscountCollectionsInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountProductsInput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products_to_add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscountCollectionsInput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

/// Minimum purchase on a discount. Null thresholds remove the requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountMinimumRequirementInput {
    pub subtotal: DiscountMinimumSubtotalInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<DiscountMinimumQuantityInput>,
}

impl DiscountMinimumRequirementInput {
    #[must_use]
    pub const fn subtotal(amount: Decimal) -> Self {
        Self {
            subtotal: DiscountMinimumSubtotalInput {
                greater_than_or_equal_to_subtotal: Some(amount),
            },
            quantity: None,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            subtotal: DiscountMinimumSubtotalInput {
                greater_than_or_equal_to_subtotal: None,
            },
            quantity: Some(DiscountMinimumQuantityInput {
                greater_than_or_equal_to_quantity: None,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountMinimumSubtotalInput {
    pub greater_than_or_equal_to_subtotal: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountMinimumQuantityInput {
    pub greater_than_or_equal_to_quantity: Option<String>,
}

/// Payload shared by the discount mutations that return the node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeDiscountPayload {
    pub code_discount_node: Option<Node>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// An object addressed only by its global ID.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: String,
}

/// A product or collection as listed for the resource pickers.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogNode {
    pub id: String,
    pub title: String,
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConnection {
    pub nodes: Vec<CatalogNode>,
}

// =============================================================================
// Discounts
// =============================================================================

operation!(DiscountCodeBasicCreate, discount_code_basic_create);

pub mod discount_code_basic_create {
    use super::{CodeDiscountPayload, DiscountCodeBasicInput, Deserialize, Serialize};

    pub const QUERY: &str = super::DISCOUNTS;
    pub const OPERATION_NAME: &str = "DiscountCodeBasicCreate";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub basic_code_discount: DiscountCodeBasicInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_basic_create: Option<CodeDiscountPayload>,
    }
}

operation!(DiscountCodeBasicUpdate, discount_code_basic_update);

pub mod discount_code_basic_update {
    use super::{CodeDiscountPayload, DiscountCodeBasicInput, Deserialize, Serialize};

    pub const QUERY: &str = super::DISCOUNTS;
    pub const OPERATION_NAME: &str = "DiscountCodeBasicUpdate";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub basic_code_discount: DiscountCodeBasicInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_basic_update: Option<CodeDiscountPayload>,
    }
}

operation!(DiscountCodeActivate, discount_code_activate);

pub mod discount_code_activate {
    use super::{CodeDiscountPayload, Deserialize, Serialize};

    pub const QUERY: &str = super::DISCOUNTS;
    pub const OPERATION_NAME: &str = "DiscountCodeActivate";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_activate: Option<CodeDiscountPayload>,
    }
}

operation!(DiscountCodeDeactivate, discount_code_deactivate);

pub mod discount_code_deactivate {
    use super::{CodeDiscountPayload, Deserialize, Serialize};

    pub const QUERY: &str = super::DISCOUNTS;
    pub const OPERATION_NAME: &str = "DiscountCodeDeactivate";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_deactivate: Option<CodeDiscountPayload>,
    }
}

operation!(DiscountCodeDelete, discount_code_delete);

pub mod discount_code_delete {
    use super::{Deserialize, Serialize, UserError};

    pub const QUERY: &str = super::DISCOUNTS;
    pub const OPERATION_NAME: &str = "DiscountCodeDelete";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub discount_code_delete: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub deleted_code_discount_id: Option<String>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }
}

// =============================================================================
// Shop and metafields
// =============================================================================

operation!(ShopId, shop_id);

pub mod shop_id {
    use super::{Deserialize, Node, Serialize};

    pub const QUERY: &str = super::SHOP;
    pub const OPERATION_NAME: &str = "ShopId";

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {}

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub shop: Node,
    }
}

operation!(MetafieldsSet, metafields_set);

pub mod metafields_set {
    use super::{Deserialize, Serialize, UserError};

    pub const QUERY: &str = super::SHOP;
    pub const OPERATION_NAME: &str = "MetafieldsSet";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub metafields: Vec<MetafieldsSetInput>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetafieldsSetInput {
        pub owner_id: String,
        pub namespace: String,
        pub key: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub metafields_set: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub metafields: Option<Vec<Metafield>>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Metafield {
        pub id: String,
        pub key: String,
        pub namespace: String,
    }
}

// =============================================================================
// Catalog
// =============================================================================

operation!(Products, products);

pub mod products {
    use super::{CatalogConnection, Deserialize, Serialize};

    pub const QUERY: &str = super::CATALOG;
    pub const OPERATION_NAME: &str = "Products";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: CatalogConnection,
    }
}

operation!(Collections, collections);

pub mod collections {
    use super::{CatalogConnection, Deserialize, Serialize};

    pub const QUERY: &str = super::CATALOG;
    pub const OPERATION_NAME: &str = "Collections";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: CatalogConnection,
    }
}

// =============================================================================
// Billing
// =============================================================================

operation!(AppSubscriptionCreate, app_subscription_create);

pub mod app_subscription_create {
    use super::{Decimal, Deserialize, Serialize, UserError};

    pub const QUERY: &str = super::BILLING;
    pub const OPERATION_NAME: &str = "AppSubscriptionCreate";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub name: String,
        pub return_url: String,
        pub test: Option<bool>,
        pub line_items: Vec<AppSubscriptionLineItemInput>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct AppSubscriptionLineItemInput {
        pub plan: AppPlanInput,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AppPlanInput {
        pub app_recurring_pricing_details: AppRecurringPricingInput,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct AppRecurringPricingInput {
        pub price: MoneyInput,
        pub interval: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyInput {
        pub amount: Decimal,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub app_subscription_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub confirmation_url: Option<String>,
        pub app_subscription: Option<AppSubscription>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AppSubscription {
        pub id: String,
        pub status: String,
    }
}

operation!(AppSubscriptionStatus, app_subscription_status);

pub mod app_subscription_status {
    use super::{Deserialize, Serialize};

    pub const QUERY: &str = super::BILLING;
    pub const OPERATION_NAME: &str = "AppSubscriptionStatus";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub node: Option<AppSubscriptionNode>,
    }

    /// Empty when the ID names something other than an app subscription.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct AppSubscriptionNode {
        pub id: Option<String>,
        pub name: Option<String>,
        pub status: Option<String>,
    }
}

// =============================================================================
// Webhooks
// =============================================================================

operation!(WebhookSubscriptionCreate, webhook_subscription_create);

pub mod webhook_subscription_create {
    use super::{Deserialize, Serialize, UserError};

    pub const QUERY: &str = super::WEBHOOKS;
    pub const OPERATION_NAME: &str = "WebhookSubscriptionCreate";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub topic: String,
        pub webhook_subscription: WebhookSubscriptionInput,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WebhookSubscriptionInput {
        pub callback_url: String,
        pub format: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub webhook_subscription_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub webhook_subscription: Option<WebhookSubscription>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct WebhookSubscription {
        pub id: String,
        pub topic: String,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_query_names_operation() {
        let body = DiscountCodeDelete::build_query(discount_code_delete::Variables {
            id: "gid://shopify/DiscountCodeNode/1".to_string(),
        });
        assert_eq!(body.operation_name, "DiscountCodeDelete");
        assert!(body.query.contains("mutation DiscountCodeDelete("));
        assert_eq!(
            serde_json::to_value(&body.variables).unwrap(),
            json!({ "id": "gid://shopify/DiscountCodeNode/1" })
        );
    }

    #[test]
    fn test_every_operation_is_in_its_document() {
        for (query, name) in [
            (discount_code_basic_create::QUERY, discount_code_basic_create::OPERATION_NAME),
            (discount_code_basic_update::QUERY, discount_code_basic_update::OPERATION_NAME),
            (discount_code_activate::QUERY, discount_code_activate::OPERATION_NAME),
            (discount_code_deactivate::QUERY, discount_code_deactivate::OPERATION_NAME),
            (shop_id::QUERY, shop_id::OPERATION_NAME),
            (metafields_set::QUERY, metafields_set::OPERATION_NAME),
            (products::QUERY, products::OPERATION_NAME),
            (collections::QUERY, collections::OPERATION_NAME),
            (app_subscription_create::QUERY, app_subscription_create::OPERATION_NAME),
            (app_subscription_status::QUERY, app_subscription_status::OPERATION_NAME),
            (webhook_subscription_create::QUERY, webhook_subscription_create::OPERATION_NAME),
        ] {
            assert!(
                query.contains(&format!(" {name}")),
                "{name} missing from its document"
            );
        }
    }

    #[test]
    fn test_discount_input_skips_unset_fields() {
        let input = DiscountCodeBasicInput {
            title: Some("Summer".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({ "title": "Summer" }));
    }

    #[test]
    fn test_discount_amount_serializes_decimal_as_string() {
        let value = DiscountCustomerGetsValueInput {
            percentage: None,
            discount_amount: Some(DiscountAmountInput {
                amount: Decimal::from_str("12.50").unwrap(),
                applies_on_each_item: false,
            }),
        };
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({ "discountAmount": { "amount": "12.50", "appliesOnEachItem": false } })
        );
    }

    #[test]
    fn test_metafield_input_renames_type() {
        let input = metafields_set::MetafieldsSetInput {
            owner_id: "gid://shopify/Shop/1".to_string(),
            namespace: "share_cart".to_string(),
            key: "widget_settings".to_string(),
            kind: "json".to_string(),
            value: "{}".to_string(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["type"], "json");
        assert_eq!(value["ownerId"], "gid://shopify/Shop/1");
    }

    #[test]
    fn test_delete_payload_deserializes() {
        let data: discount_code_delete::ResponseData = serde_json::from_value(json!({
            "discountCodeDelete": {
                "deletedCodeDiscountId": "gid://shopify/DiscountCodeNode/1",
                "userErrors": []
            }
        }))
        .unwrap();
        let payload = data.discount_code_delete.unwrap();
        assert_eq!(
            payload.deleted_code_discount_id.as_deref(),
            Some("gid://shopify/DiscountCodeNode/1")
        );
    }
}
