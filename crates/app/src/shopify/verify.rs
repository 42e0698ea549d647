//! Signature verification for requests Shopify sends to the app.
//!
//! All comparisons go through `Mac::verify_slice`, which is constant time.
//!
//! | Source | Carrier | Message | Encoding |
//! |--------|---------|---------|----------|
//! | OAuth callback | `hmac` query param | sorted `k=v` joined by `&` | hex |
//! | Webhook | `X-Shopify-Hmac-Sha256` header | raw body | base64 |
//! | App proxy | `signature` query param | sorted `k=v` concatenated | hex |

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// HMAC accepts keys of any length, so this only fails in theory.
fn mac(secret: &[u8]) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret).ok()
}

/// Verify the `hmac` parameter of an OAuth callback (or install) query.
#[must_use]
pub fn verify_oauth_query(params: &[(String, String)], secret: &[u8]) -> bool {
    let Some(provided) = params
        .iter()
        .find_map(|(k, v)| (k == "hmac").then_some(v.as_str()))
    else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.sort_unstable();

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Verify a webhook body against its `X-Shopify-Hmac-Sha256` header.
#[must_use]
pub fn verify_webhook(body: &[u8], header: &str, secret: &[u8]) -> bool {
    let Ok(provided) = STANDARD.decode(header.trim()) else {
        return false;
    };

    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Verify the `signature` parameter of an app proxy request.
///
/// Repeated keys are joined with `,` before signing.
#[must_use]
pub fn verify_proxy_signature(params: &[(String, String)], secret: &[u8]) -> bool {
    let Some(provided) = params
        .iter()
        .find_map(|(k, v)| (k == "signature").then_some(v.as_str()))
    else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let message = proxy_message(params);

    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

fn proxy_message(params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (k, v) in params.iter().filter(|(k, _)| k != "signature") {
        grouped.entry(k.as_str()).or_default().push(v.as_str());
    }

    grouped
        .iter()
        .map(|(k, values)| format!("{k}={}", values.join(",")))
        .collect()
}

/// Compute a hex HMAC-SHA256, as Shopify does for query signatures.
#[must_use]
pub fn hex_hmac(message: &str, secret: &[u8]) -> String {
    mac(secret).map_or_else(String::new, |mut mac| {
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    })
}

/// Compute a base64 HMAC-SHA256, as Shopify does for webhook bodies.
#[must_use]
pub fn base64_hmac(body: &[u8], secret: &[u8]) -> String {
    mac(secret).map_or_else(String::new, |mut mac| {
        mac.update(body);
        STANDARD.encode(mac.finalize().into_bytes())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"hush";

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_oauth_query_valid() {
        let message = "code=0907a61c0c8d55e99db179b68161bc00&shop=some-shop.myshopify.com&state=0.6784241404160823&timestamp=1337178173";
        let hmac = hex_hmac(message, SECRET);
        let query = params(&[
            ("shop", "some-shop.myshopify.com"),
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("timestamp", "1337178173"),
            ("state", "0.6784241404160823"),
            ("hmac", &hmac),
        ]);
        assert!(verify_oauth_query(&query, SECRET));
    }

    #[test]
    fn test_oauth_query_tampered() {
        let hmac = hex_hmac("code=abc&shop=a.myshopify.com&timestamp=1", SECRET);
        let query = params(&[
            ("shop", "b.myshopify.com"),
            ("code", "abc"),
            ("timestamp", "1"),
            ("hmac", &hmac),
        ]);
        assert!(!verify_oauth_query(&query, SECRET));
    }

    #[test]
    fn test_oauth_query_missing_or_malformed_hmac() {
        assert!(!verify_oauth_query(&params(&[("shop", "a.myshopify.com")]), SECRET));
        assert!(!verify_oauth_query(
            &params(&[("shop", "a.myshopify.com"), ("hmac", "not-hex")]),
            SECRET
        ));
    }

    #[test]
    fn test_webhook_valid_and_tampered() {
        let body = br#"{"id":820982911946154508,"email":"jon@example.com"}"#;
        let header = base64_hmac(body, SECRET);
        assert!(verify_webhook(body, &header, SECRET));
        assert!(!verify_webhook(b"{\"id\":1}", &header, SECRET));
        assert!(!verify_webhook(body, &header, b"other-secret"));
        assert!(!verify_webhook(body, "%%%", SECRET));
    }

    #[test]
    fn test_proxy_signature_joins_repeated_keys() {
        let query = params(&[
            ("shop", "some-shop.myshopify.com"),
            ("path_prefix", "/apps/share-cart"),
            ("timestamp", "1317327555"),
            ("extra", "1"),
            ("extra", "2"),
        ]);
        assert_eq!(
            proxy_message(&query),
            "extra=1,2path_prefix=/apps/share-cartshop=some-shop.myshopify.comtimestamp=1317327555"
        );

        let signature = hex_hmac(&proxy_message(&query), SECRET);
        let mut signed = query.clone();
        signed.push(("signature".to_string(), signature));
        assert!(verify_proxy_signature(&signed, SECRET));

        signed[0].1 = "evil-shop.myshopify.com".to_string();
        assert!(!verify_proxy_signature(&signed, SECRET));
    }

    #[test]
    fn test_proxy_signature_missing() {
        assert!(!verify_proxy_signature(
            &params(&[("shop", "a.myshopify.com")]),
            SECRET
        ));
    }
}
