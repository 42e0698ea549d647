//! Admin API GraphQL client for a single shop.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphql_client::GraphQLQuery;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use share_cart_core::{DiscountKind, PlanDuration, ShopDomain};

use super::queries::{
    self, AppSubscriptionCreate, AppSubscriptionStatus, CatalogNode, Collections, DiscountAmountInput,
    DiscountCodeActivate, DiscountCodeBasicCreate, DiscountCodeBasicInput,
    DiscountCodeBasicUpdate, DiscountCodeDeactivate, DiscountCodeDelete,
    DiscountCollectionsInput, DiscountCustomerGetsInput, DiscountCustomerGetsValueInput,
    DiscountCustomerSelectionInput, DiscountItemsInput, DiscountMinimumRequirementInput,
    DiscountProductsInput, MetafieldsSet, Products, ShopId,
    WebhookSubscriptionCreate,
};
use super::{GraphQLError, ShopifyError, check_user_errors};
use crate::models::{Coupon, NewCoupon};

/// Metafield namespace owned by the app.
pub const METAFIELD_NAMESPACE: &str = "share_cart";
/// Metafield key holding the widget settings read by the storefront.
pub const METAFIELD_KEY: &str = "widget_settings";

const CATALOG_PAGE_SIZE: i64 = 250;

/// Coupon fields mirrored to a Shopify basic discount code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountMirror {
    pub title: String,
    pub code: String,
    pub kind: DiscountKind,
    pub percentage: Option<Decimal>,
    pub fixed_amount: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub minimum_subtotal: Option<Decimal>,
    /// Remove a minimum set earlier when `minimum_subtotal` is `None`.
    pub clear_minimum: bool,
}

impl From<&NewCoupon> for DiscountMirror {
    fn from(coupon: &NewCoupon) -> Self {
        Self {
            title: coupon.name.clone(),
            code: coupon.code.clone(),
            kind: coupon.discount_type,
            percentage: coupon.percentage_value,
            fixed_amount: coupon.fixed_amount,
            starts_at: coupon.start_date,
            ends_at: coupon.end_date,
            minimum_subtotal: coupon.minimum_subtotal(),
            clear_minimum: false,
        }
    }
}

impl From<&Coupon> for DiscountMirror {
    fn from(coupon: &Coupon) -> Self {
        Self {
            title: coupon.name.clone(),
            code: coupon.code.clone(),
            kind: coupon.discount_type,
            percentage: coupon.percentage_value,
            fixed_amount: coupon.fixed_amount,
            starts_at: coupon.start_date,
            ends_at: coupon.end_date,
            minimum_subtotal: coupon.minimum_subtotal(),
            clear_minimum: false,
        }
    }
}

impl DiscountMirror {
    fn value_input(&self) -> DiscountCustomerGetsValueInput {
        match self.kind {
            DiscountKind::Percentage => DiscountCustomerGetsValueInput {
                percentage: Some(
                    self.percentage
                        .and_then(|p| p.to_f64())
                        .unwrap_or_default(),
                ),
                discount_amount: None,
            },
            DiscountKind::Fixed => DiscountCustomerGetsValueInput {
                percentage: None,
                discount_amount: Some(DiscountAmountInput {
                    amount: self.fixed_amount.unwrap_or_default(),
                    applies_on_each_item: false,
                }),
            },
        }
    }

    /// Build the `DiscountCodeBasicInput` for this coupon and item scope.
    #[must_use]
    pub fn to_input(&self, scope: &DiscountScopeChange) -> DiscountCodeBasicInput {
        DiscountCodeBasicInput {
            title: Some(self.title.clone()),
            code: Some(self.code.clone()),
            starts_at: Some(self.starts_at),
            ends_at: Some(self.ends_at),
            customer_selection: Some(DiscountCustomerSelectionInput { all: true }),
            customer_gets: Some(DiscountCustomerGetsInput {
                value: self.value_input(),
                items: scope.items_input(),
            }),
            applies_once_per_customer: Some(true),
            minimum_requirement: match self.minimum_subtotal {
                Some(subtotal) => Some(DiscountMinimumRequirementInput::subtotal(subtotal)),
                None if self.clear_minimum => Some(DiscountMinimumRequirementInput::none()),
                None => None,
            },
        }
    }
}

/// Products and collections to attach to or detach from a discount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountScopeChange {
    pub products_to_add: Vec<String>,
    pub products_to_remove: Vec<String>,
    pub collections_to_add: Vec<String>,
    pub collections_to_remove: Vec<String>,
    /// Whether any product remains targeted after the change.
    pub targets_products: bool,
    /// Whether any collection remains targeted after the change.
    pub targets_collections: bool,
}

impl DiscountScopeChange {
    /// Scope for a new discount.
    #[must_use]
    pub fn initial(product_ids: &[String], collection_ids: &[String]) -> Self {
        Self::between(&[], &[], product_ids, collection_ids)
    }

    /// Scope moving a discount from the current ids to the updated ones.
    ///
    /// Order of the updated lists is preserved in the additions.
    #[must_use]
    pub fn between(
        current_products: &[String],
        current_collections: &[String],
        updated_products: &[String],
        updated_collections: &[String],
    ) -> Self {
        let (products_to_add, products_to_remove) = diff(current_products, updated_products);
        let (collections_to_add, collections_to_remove) =
            diff(current_collections, updated_collections);

        Self {
            products_to_add,
            products_to_remove,
            collections_to_add,
            collections_to_remove,
            targets_products: !updated_products.is_empty(),
            targets_collections: !updated_collections.is_empty(),
        }
    }

    fn items_input(&self) -> DiscountItemsInput {
        if !self.targets_products && !self.targets_collections {
            return DiscountItemsInput {
                all: Some(true),
                ..Default::default()
            };
        }

        let touches_products = self.targets_products || !self.products_to_remove.is_empty();
        let touches_collections =
            self.targets_collections || !self.collections_to_remove.is_empty();

        DiscountItemsInput {
            all: Some(false),
            products: touches_products.then(|| DiscountProductsInput {
                products_to_add: self.products_to_add.clone(),
                products_to_remove: self.products_to_remove.clone(),
            }),
            collections: touches_collections.then(|| DiscountCollectionsInput {
                add: self.collections_to_add.clone(),
                remove: self.collections_to_remove.clone(),
            }),
        }
    }
}

fn diff(current: &[String], updated: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let updated_set: HashSet<&str> = updated.iter().map(String::as_str).collect();

    let mut added = Vec::new();
    for id in updated {
        if !current_set.contains(id.as_str()) && !added.contains(id) {
            added.push(id.clone());
        }
    }
    let mut removed = Vec::new();
    for id in current {
        if !updated_set.contains(id.as_str()) && !removed.contains(id) {
            removed.push(id.clone());
        }
    }
    (added, removed)
}

/// A product or collection offered in the coupon form's pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub handle: String,
}

impl From<CatalogNode> for CatalogItem {
    fn from(node: CatalogNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            handle: node.handle,
        }
    }
}

/// Admin API client bound to one shop and its offline token.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    shop: ShopDomain,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("shop", &self.inner.shop)
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

impl AdminClient {
    pub(super) fn new(
        client: reqwest::Client,
        shop: ShopDomain,
        api_version: &str,
        access_token: SecretString,
    ) -> Self {
        let endpoint = format!("https://{shop}/admin/api/{api_version}/graphql.json");
        Self {
            inner: Arc::new(AdminClientInner {
                client,
                shop,
                endpoint,
                access_token,
            }),
        }
    }

    /// The shop this client talks to.
    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(2);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "Invalid or revoked access token".to_string(),
            ));
        }

        let graphql_response: GraphQLResponse<Q::ResponseData> = response.json().await?;

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(errors));
        }

        graphql_response
            .data
            .ok_or_else(|| ShopifyError::UnexpectedResponse("No data in response".to_string()))
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Create a basic discount code. Returns the `DiscountCodeNode` GID.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the input.
    #[instrument(skip(self, discount, scope), fields(shop = %self.inner.shop, code = %discount.code))]
    pub async fn create_discount(
        &self,
        discount: &DiscountMirror,
        scope: &DiscountScopeChange,
    ) -> Result<String, ShopifyError> {
        let variables = queries::discount_code_basic_create::Variables {
            basic_code_discount: discount.to_input(scope),
        };

        let payload = self
            .execute::<DiscountCodeBasicCreate>(variables)
            .await?
            .discount_code_basic_create
            .ok_or_else(|| missing("discountCodeBasicCreate"))?;
        check_user_errors(payload.user_errors)?;

        payload
            .code_discount_node
            .map(|node| node.id)
            .ok_or_else(|| missing("codeDiscountNode"))
    }

    /// Update a basic discount code.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the input.
    #[instrument(skip(self, discount, scope), fields(shop = %self.inner.shop))]
    pub async fn update_discount(
        &self,
        id: &str,
        discount: &DiscountMirror,
        scope: &DiscountScopeChange,
    ) -> Result<(), ShopifyError> {
        let variables = queries::discount_code_basic_update::Variables {
            id: id.to_string(),
            basic_code_discount: discount.to_input(scope),
        };

        let payload = self
            .execute::<DiscountCodeBasicUpdate>(variables)
            .await?
            .discount_code_basic_update
            .ok_or_else(|| missing("discountCodeBasicUpdate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Activate a discount code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn activate_discount(&self, id: &str) -> Result<(), ShopifyError> {
        let variables = queries::discount_code_activate::Variables { id: id.to_string() };
        let payload = self
            .execute::<DiscountCodeActivate>(variables)
            .await?
            .discount_code_activate
            .ok_or_else(|| missing("discountCodeActivate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Deactivate a discount code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn deactivate_discount(&self, id: &str) -> Result<(), ShopifyError> {
        let variables = queries::discount_code_deactivate::Variables { id: id.to_string() };
        let payload = self
            .execute::<DiscountCodeDeactivate>(variables)
            .await?
            .discount_code_deactivate
            .ok_or_else(|| missing("discountCodeDeactivate"))?;
        check_user_errors(payload.user_errors)
    }

    /// Delete a discount code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn delete_discount(&self, id: &str) -> Result<(), ShopifyError> {
        let variables = queries::discount_code_delete::Variables { id: id.to_string() };
        let payload = self
            .execute::<DiscountCodeDelete>(variables)
            .await?
            .discount_code_delete
            .ok_or_else(|| missing("discountCodeDelete"))?;
        check_user_errors(payload.user_errors)
    }

    // =========================================================================
    // Shop and metafields
    // =========================================================================

    /// The shop's global ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn shop_id(&self) -> Result<String, ShopifyError> {
        let data = self
            .execute::<ShopId>(queries::shop_id::Variables::default())
            .await?;
        Ok(data.shop.id)
    }

    /// Write the widget settings metafield on the shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self, settings), fields(shop = %self.inner.shop))]
    pub async fn set_widget_metafield(
        &self,
        shop_gid: &str,
        settings: &serde_json::Value,
    ) -> Result<(), ShopifyError> {
        let variables = queries::metafields_set::Variables {
            metafields: vec![queries::metafields_set::MetafieldsSetInput {
                owner_id: shop_gid.to_string(),
                namespace: METAFIELD_NAMESPACE.to_string(),
                key: METAFIELD_KEY.to_string(),
                kind: "json".to_string(),
                value: settings.to_string(),
            }],
        };

        let payload = self
            .execute::<MetafieldsSet>(variables)
            .await?
            .metafields_set
            .ok_or_else(|| missing("metafieldsSet"))?;
        check_user_errors(payload.user_errors)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// First page of the shop's products, sorted by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn products(&self) -> Result<Vec<CatalogItem>, ShopifyError> {
        let data = self
            .execute::<Products>(queries::products::Variables {
                first: CATALOG_PAGE_SIZE,
            })
            .await?;
        Ok(data.products.nodes.into_iter().map(Into::into).collect())
    }

    /// First page of the shop's collections, sorted by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn collections(&self) -> Result<Vec<CatalogItem>, ShopifyError> {
        let data = self
            .execute::<Collections>(queries::collections::Variables {
                first: CATALOG_PAGE_SIZE,
            })
            .await?;
        Ok(data.collections.nodes.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Billing
    // =========================================================================

    /// Create a recurring app subscription. Returns the confirmation URL the
    /// merchant must visit to approve the charge.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the charge.
    #[instrument(skip(self, return_url), fields(shop = %self.inner.shop))]
    pub async fn create_app_subscription(
        &self,
        name: &str,
        amount: Decimal,
        duration: PlanDuration,
        return_url: &str,
        test: bool,
    ) -> Result<String, ShopifyError> {
        use queries::app_subscription_create::{
            AppPlanInput, AppRecurringPricingInput, AppSubscriptionLineItemInput, MoneyInput,
            Variables,
        };

        let variables = Variables {
            name: name.to_string(),
            return_url: return_url.to_string(),
            test: Some(test),
            line_items: vec![AppSubscriptionLineItemInput {
                plan: AppPlanInput {
                    app_recurring_pricing_details: AppRecurringPricingInput {
                        price: MoneyInput {
                            amount,
                            currency_code: "USD".to_string(),
                        },
                        interval: duration.shopify_interval().to_string(),
                    },
                },
            }],
        };

        let payload = self
            .execute::<AppSubscriptionCreate>(variables)
            .await?
            .app_subscription_create
            .ok_or_else(|| missing("appSubscriptionCreate"))?;
        check_user_errors(payload.user_errors)?;

        payload
            .confirmation_url
            .ok_or_else(|| missing("confirmationUrl"))
    }

    /// Status of an app subscription (e.g. `ACTIVE`, `PENDING`, `DECLINED`).
    ///
    /// Accepts either the numeric `charge_id` Shopify appends to the return
    /// URL or the subscription's global ID. Returns `None` when no app
    /// subscription of this app has that ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn app_subscription_status(
        &self,
        charge_id: &str,
    ) -> Result<Option<String>, ShopifyError> {
        let variables = queries::app_subscription_status::Variables {
            id: app_subscription_gid(charge_id),
        };
        let node = self.execute::<AppSubscriptionStatus>(variables).await?.node;
        Ok(node.and_then(|n| n.status))
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    /// Subscribe the app to a webhook topic (e.g. `ORDERS_CREATE`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Shopify reports user errors.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn create_webhook(&self, topic: &str, callback_url: &str) -> Result<(), ShopifyError> {
        use queries::webhook_subscription_create::{Variables, WebhookSubscriptionInput};

        let variables = Variables {
            topic: topic.to_string(),
            webhook_subscription: WebhookSubscriptionInput {
                callback_url: callback_url.to_string(),
                format: "JSON".to_string(),
            },
        };

        let payload = self
            .execute::<WebhookSubscriptionCreate>(variables)
            .await?
            .webhook_subscription_create
            .ok_or_else(|| missing("webhookSubscriptionCreate"))?;
        check_user_errors(payload.user_errors)
    }
}

/// Global ID of an app subscription given its numeric charge ID or GID.
#[must_use]
pub fn app_subscription_gid(charge_id: &str) -> String {
    let charge_id = charge_id.trim();
    if charge_id.starts_with("gid://") {
        charge_id.to_string()
    } else {
        format!("gid://shopify/AppSubscription/{charge_id}")
    }
}

fn missing(field: &str) -> ShopifyError {
    ShopifyError::UnexpectedResponse(format!("{field} missing from response"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn mirror(kind: DiscountKind) -> DiscountMirror {
        DiscountMirror {
            title: "Summer".to_string(),
            code: "SUM1234".to_string(),
            kind,
            percentage: Some(Decimal::from_str("0.15").unwrap()),
            fixed_amount: Some(Decimal::from_str("5.00").unwrap()),
            starts_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            minimum_subtotal: None,
            clear_minimum: false,
        }
    }

    #[test]
    fn test_scope_between_computes_set_differences() {
        let scope = DiscountScopeChange::between(
            &ids(&["p1", "p2"]),
            &ids(&["c1"]),
            &ids(&["p2", "p3"]),
            &ids(&[]),
        );
        assert_eq!(scope.products_to_add, ids(&["p3"]));
        assert_eq!(scope.products_to_remove, ids(&["p1"]));
        assert!(scope.collections_to_add.is_empty());
        assert_eq!(scope.collections_to_remove, ids(&["c1"]));
        assert!(scope.targets_products);
        assert!(!scope.targets_collections);
    }

    #[test]
    fn test_scope_diff_ignores_duplicates() {
        let scope = DiscountScopeChange::initial(&ids(&["p1", "p1"]), &[]);
        assert_eq!(scope.products_to_add, ids(&["p1"]));
    }

    #[test]
    fn test_percentage_input() {
        let input = mirror(DiscountKind::Percentage)
            .to_input(&DiscountScopeChange::initial(&ids(&["gid://shopify/Product/1"]), &[]));
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["customerGets"]["value"], json!({ "percentage": 0.15 }));
        assert_eq!(
            value["customerGets"]["items"],
            json!({ "all": false, "products": { "productsToAdd": ["gid://shopify/Product/1"] } })
        );
        assert_eq!(value["customerSelection"], json!({ "all": true }));
        assert_eq!(value["appliesOncePerCustomer"], json!(true));
        assert_eq!(value["startsAt"], json!("2025-06-01T00:00:00Z"));
        assert!(value.get("minimumRequirement").is_none());
    }

    #[test]
    fn test_fixed_input_with_minimum_subtotal() {
        let mut discount = mirror(DiscountKind::Fixed);
        discount.minimum_subtotal = Some(Decimal::from_str("50").unwrap());
        let input =
            discount.to_input(&DiscountScopeChange::initial(&[], &ids(&["gid://shopify/Collection/7"])));
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value["customerGets"]["value"],
            json!({ "discountAmount": { "amount": "5.00", "appliesOnEachItem": false } })
        );
        assert_eq!(
            value["customerGets"]["items"],
            json!({ "all": false, "collections": { "add": ["gid://shopify/Collection/7"] } })
        );
        assert_eq!(
            value["minimumRequirement"],
            json!({ "subtotal": { "greaterThanOrEqualToSubtotal": "50" } })
        );
    }

    #[test]
    fn test_app_subscription_gid() {
        assert_eq!(app_subscription_gid("27361"), "gid://shopify/AppSubscription/27361");
        assert_eq!(
            app_subscription_gid("gid://shopify/AppSubscription/27361"),
            "gid://shopify/AppSubscription/27361"
        );
    }

    #[test]
    fn test_removed_minimum_is_cleared() {
        let scope = DiscountScopeChange::default();
        let mut discount = mirror(DiscountKind::Percentage);
        let untouched = serde_json::to_value(discount.to_input(&scope)).unwrap();
        assert!(untouched.get("minimumRequirement").is_none());

        discount.clear_minimum = true;
        let value = serde_json::to_value(discount.to_input(&scope)).unwrap();
        assert_eq!(
            value["minimumRequirement"],
            json!({
                "subtotal": { "greaterThanOrEqualToSubtotal": null },
                "quantity": { "greaterThanOrEqualToQuantity": null }
            })
        );
    }

    #[test]
    fn test_empty_scope_targets_all_items() {
        let input = mirror(DiscountKind::Percentage).to_input(&DiscountScopeChange::default());
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["customerGets"]["items"], json!({ "all": true }));
    }
}
