//! Shopify integration.
//!
//! # Architecture
//!
//! - [`ShopifyApp`] holds the app credentials: OAuth install, token exchange,
//!   and creation of per-shop [`AdminClient`]s
//! - [`AdminClient`] talks to one shop's Admin GraphQL API with its offline token
//! - Operations implement `graphql_client::GraphQLQuery` over the documents
//!   in `src/shopify/graphql/`
//! - [`verify`] checks every signature Shopify puts on inbound requests
//!   (OAuth callbacks, webhooks, app proxy calls)
//! - [`session_token`] validates App Bridge session tokens from the embedded admin
//!
//! # Example
//!
//! ```rust,ignore
//! let admin = state.shopify().admin(&shop, &installed.access_token);
//! let shop_gid = admin.shop_id().await?;
//! admin.set_widget_metafield(&shop_gid, &settings).await?;
//! ```

mod app;
mod client;
pub mod queries;
pub mod session_token;
pub mod verify;

pub use app::{AccessToken, ShopifyApp};
pub use client::{AdminClient, CatalogItem, DiscountMirror, DiscountScopeChange};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when interacting with Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// A mutation was rejected with `userErrors`.
    #[error("User errors: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),

    /// The response was missing data the operation promised.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

/// A validation error returned in a mutation payload's `userErrors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human readable message.
    pub message: String,
    /// Machine readable code, when the payload type has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fail with `UserErrors` when a mutation payload reported any.
pub(crate) fn check_user_errors(errors: Vec<UserError>) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ShopifyError::UserErrors(errors))
    }
}

/// Resource kinds addressed by Shopify global IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GidKind {
    Product,
    Collection,
}

impl GidKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Collection => "Collection",
        }
    }
}

/// Normalize an ID from the admin UI to a global ID.
///
/// The resource picker returns full GIDs, older clients send bare numbers.
#[must_use]
pub fn to_gid(kind: GidKind, id: &str) -> String {
    let id = id.trim();
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/{}/{id}", kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: Field not found; Invalid ID");
    }

    #[test]
    fn test_user_error_formatting_includes_field_path() {
        let err = ShopifyError::UserErrors(vec![
            UserError {
                field: Some(vec!["basicCodeDiscount".to_string(), "code".to_string()]),
                message: "Code must be unique".to_string(),
                code: Some("TAKEN".to_string()),
            },
            UserError {
                field: None,
                message: "Something else".to_string(),
                code: None,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "User errors: basicCodeDiscount.code: Code must be unique; Something else"
        );
    }

    #[test]
    fn test_check_user_errors() {
        assert!(check_user_errors(vec![]).is_ok());
        let err = check_user_errors(vec![UserError {
            field: None,
            message: "nope".to_string(),
            code: None,
        }]);
        assert!(matches!(err, Err(ShopifyError::UserErrors(e)) if e.len() == 1));
    }

    #[test]
    fn test_to_gid() {
        assert_eq!(
            to_gid(GidKind::Product, "123"),
            "gid://shopify/Product/123"
        );
        assert_eq!(
            to_gid(GidKind::Collection, "gid://shopify/Collection/9"),
            "gid://shopify/Collection/9"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
