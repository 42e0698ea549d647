//! App Bridge session token validation.
//!
//! The embedded admin sends `Authorization: Bearer <jwt>` on every request.
//! Tokens are HS256 JWTs signed with the app secret; `dest` names the shop.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use share_cart_core::ShopDomain;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
const LEEWAY_SECONDS: u64 = 10;

/// Reasons a session token is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token issued for another app")]
    WrongAudience,
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
}

impl From<jsonwebtoken::errors::Error> for SessionTokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm
            }
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAudience => Self::WrongAudience,
            _ => Self::Malformed,
        }
    }
}

/// Verified claims of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub dest: String,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl SessionClaims {
    /// Shop the token was issued for, taken from `dest`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDestination` if `dest` is not a shop URL.
    pub fn shop(&self) -> Result<ShopDomain, SessionTokenError> {
        ShopDomain::parse(&self.dest)
            .map_err(|e| SessionTokenError::InvalidDestination(e.to_string()))
    }
}

fn validation(api_key: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[api_key]);
    validation.set_required_spec_claims(&["exp", "aud"]);
    validation.leeway = LEEWAY_SECONDS;
    validation.validate_nbf = true;
    validation
}

/// Verify a session token against the current time and return its shop
/// and claims.
///
/// # Errors
///
/// Returns a `SessionTokenError` describing the check that failed.
pub fn verify(
    token: &str,
    api_key: &str,
    api_secret: &[u8],
) -> Result<(ShopDomain, SessionClaims), SessionTokenError> {
    let data = jsonwebtoken::decode::<SessionClaims>(
        token.trim(),
        &DecodingKey::from_secret(api_secret),
        &validation(api_key),
    )?;

    let shop = data.claims.shop()?;
    Ok((shop, data.claims))
}

/// Sign claims into an HS256 token. Used by tests and local tooling.
///
/// # Errors
///
/// Returns the encoder error if the claims cannot be serialized.
pub fn sign(
    claims: &SessionClaims,
    api_secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(api_secret),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const KEY: &str = "app-key";
    const SECRET: &[u8] = b"app-secret";

    fn claims() -> SessionClaims {
        let now = jsonwebtoken::get_current_timestamp();
        SessionClaims {
            iss: "https://store.myshopify.com/admin".to_string(),
            dest: "https://store.myshopify.com".to_string(),
            aud: KEY.to_string(),
            sub: Some("42".to_string()),
            exp: now + 60,
            nbf: Some(now - 5),
            iat: Some(now - 5),
            jti: Some("abc".to_string()),
            sid: Some("session".to_string()),
        }
    }

    #[test]
    fn test_verify_valid_token() {
        let token = sign(&claims(), SECRET).unwrap();
        let (shop, claims) = verify(&token, KEY, SECRET).unwrap();
        assert_eq!(shop.as_str(), "store.myshopify.com");
        assert_eq!(claims.sub.as_deref(), Some("42"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = sign(&claims(), b"other").unwrap();
        assert_eq!(
            verify(&token, KEY, SECRET).unwrap_err(),
            SessionTokenError::InvalidSignature
        );
    }

    #[test]
    fn test_verify_rejects_expired() {
        let mut c = claims();
        c.exp -= 120;
        let token = sign(&c, SECRET).unwrap();
        assert_eq!(verify(&token, KEY, SECRET).unwrap_err(), SessionTokenError::Expired);
    }

    #[test]
    fn test_verify_rejects_future_tokens() {
        let mut c = claims();
        c.nbf = Some(c.exp - 10);
        let token = sign(&c, SECRET).unwrap();
        assert_eq!(
            verify(&token, KEY, SECRET).unwrap_err(),
            SessionTokenError::NotYetValid
        );
    }

    #[test]
    fn test_verify_tolerates_small_skew() {
        let mut c = claims();
        let now = jsonwebtoken::get_current_timestamp();
        c.exp = now - 5;
        c.nbf = Some(now + 5);
        let token = sign(&c, SECRET).unwrap();
        assert!(verify(&token, KEY, SECRET).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_audience() {
        let token = sign(&claims(), SECRET).unwrap();
        assert_eq!(
            verify(&token, "other-app", SECRET).unwrap_err(),
            SessionTokenError::WrongAudience
        );
    }

    #[test]
    fn test_verify_rejects_non_shop_destination() {
        let mut c = claims();
        c.dest = "https://evil.example.com".to_string();
        let token = sign(&c, SECRET).unwrap();
        assert!(matches!(
            verify(&token, KEY, SECRET),
            Err(SessionTokenError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert_eq!(verify("a.b", KEY, SECRET).unwrap_err(), SessionTokenError::Malformed);
        assert_eq!(verify("", KEY, SECRET).unwrap_err(), SessionTokenError::Malformed);
    }

    #[test]
    fn test_verify_rejects_other_algorithms() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims(),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(
            verify(&token, KEY, SECRET).unwrap_err(),
            SessionTokenError::UnsupportedAlgorithm
        );
    }
}
