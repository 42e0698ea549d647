//! App credentials, OAuth install flow and per-shop client construction.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use share_cart_core::ShopDomain;

use super::{AdminClient, ShopifyError};
use crate::config::ShopifyAppConfig;

/// Offline access token granted at install.
#[derive(Clone)]
pub struct AccessToken {
    pub access_token: SecretString,
    /// Granted scopes, comma separated.
    pub scope: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    scope: String,
}

/// The Shopify app: credentials plus the shared HTTP client.
#[derive(Clone)]
pub struct ShopifyApp {
    inner: Arc<ShopifyAppInner>,
}

struct ShopifyAppInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    scopes: String,
}

impl ShopifyApp {
    /// Create the app from configuration.
    #[must_use]
    pub fn new(config: &ShopifyAppConfig) -> Self {
        Self {
            inner: Arc::new(ShopifyAppInner {
                client: reqwest::Client::new(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                api_version: config.api_version.clone(),
                scopes: config.scopes.clone(),
            }),
        }
    }

    /// The app's API key (the `client_id`, and the `aud` of session tokens).
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// The app secret as bytes, for signature verification.
    #[must_use]
    pub fn api_secret(&self) -> &[u8] {
        self.inner.api_secret.expose_secret().as_bytes()
    }

    /// The Admin API version requests are pinned to.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// URL to send the merchant to for granting the app's scopes.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, redirect_uri: &str, state: &str) -> String {
        format!(
            "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&self.inner.scopes),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the exchange.
    /// Returns `ShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessToken, ShopifyError> {
        let url = format!("https://{shop}/admin/oauth/access_token");

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed ({status}): {text}"
            )));
        }

        let token: OAuthTokenResponse = response.json().await?;

        Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            scope: token.scope,
        })
    }

    /// Admin API client for one shop.
    #[must_use]
    pub fn admin(&self, shop: &ShopDomain, access_token: &SecretString) -> AdminClient {
        AdminClient::new(
            self.inner.client.clone(),
            shop.clone(),
            &self.inner.api_version,
            access_token.clone(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn app() -> ShopifyApp {
        ShopifyApp::new(&ShopifyAppConfig {
            api_key: "key123".to_string(),
            api_secret: SecretString::from("s3cr3t"),
            api_version: "2025-04".to_string(),
            scopes: "read_products,write_discounts".to_string(),
            app_handle: "share-cart".to_string(),
            billing_test: true,
        })
    }

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        let url = app().authorization_url(
            &shop,
            "https://app.example.com/api/auth/callback",
            "nonce",
        );
        assert_eq!(
            url,
            "https://demo.myshopify.com/admin/oauth/authorize?client_id=key123\
             &scope=read_products%2Cwrite_discounts\
             &redirect_uri=https%3A%2F%2Fapp.example.com%2Fapi%2Fauth%2Fcallback\
             &state=nonce"
        );
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken {
            access_token: SecretString::from("shpat_abc"),
            scope: "read_products".to_string(),
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("shpat_abc"));
        assert!(debug.contains("read_products"));
    }

    #[test]
    fn test_accessors() {
        let app = app();
        assert_eq!(app.api_key(), "key123");
        assert_eq!(app.api_secret(), b"s3cr3t");
        assert_eq!(app.api_version(), "2025-04");
    }
}
