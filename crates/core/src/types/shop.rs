//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The store handle contains characters other than `a-z`, `0-9` and `-`.
    #[error("shop domain contains invalid characters")]
    InvalidCharacters,
    /// The domain does not end in `.myshopify.com`.
    #[error("shop domain must end with .myshopify.com")]
    NotMyshopify,
}

/// A Shopify store's permanent domain, e.g. `my-store.myshopify.com`.
///
/// Every row the app stores is scoped by this value, and it is the only
/// shop identity Shopify hands us in OAuth callbacks, webhook headers,
/// session tokens and app proxy requests.
///
/// ## Constraints
///
/// - Lower-cased on parse
/// - Must end with `.myshopify.com`
/// - Store handle is non-empty and made of `a-z`, `0-9` and `-`, not starting with `-`
///
/// ## Examples
///
/// ```
/// use share_cart_core::ShopDomain;
///
/// assert!(ShopDomain::parse("my-store.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("My-Store.MyShopify.com").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("evil.com").is_err());
/// assert!(ShopDomain::parse("a.b.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a shop domain.
    pub const MAX_LENGTH: usize = 255;

    const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// Surrounding whitespace is trimmed and a leading `https://` is
    /// tolerated, since the admin frontend sometimes sends full origins.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, not a
    /// `myshopify.com` domain, or its store handle has invalid characters.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("https://")
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if trimmed.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        let handle = lower
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::NotMyshopify)?;

        if handle.is_empty()
            || handle.starts_with('-')
            || !handle
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ShopDomainError::InvalidCharacters);
        }

        Ok(Self(lower))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Only validated domains are ever written
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("store.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-store-2.myshopify.com").is_ok());
        assert!(ShopDomain::parse("  store.myshopify.com ").is_ok());
        assert!(ShopDomain::parse("https://store.myshopify.com/").is_ok());
    }

    #[test]
    fn test_parse_lowercases() {
        let shop = ShopDomain::parse("MyStore.MYSHOPIFY.com").unwrap();
        assert_eq!(shop.as_str(), "mystore.myshopify.com");
        assert_eq!(shop.handle(), "mystore");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_not_myshopify() {
        assert_eq!(
            ShopDomain::parse("store.example.com"),
            Err(ShopDomainError::NotMyshopify)
        );
        assert_eq!(
            ShopDomain::parse("myshopify.com"),
            Err(ShopDomainError::NotMyshopify)
        );
    }

    #[test]
    fn test_parse_invalid_handle() {
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
        assert_eq!(
            ShopDomain::parse("-store.myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(300));
        assert!(matches!(
            ShopDomain::parse(&long),
            Err(ShopDomainError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_validates() {
        let shop: ShopDomain = serde_json::from_str("\"store.myshopify.com\"").unwrap();
        assert_eq!(shop.as_str(), "store.myshopify.com");
        assert_eq!(serde_json::to_string(&shop).unwrap(), "\"store.myshopify.com\"");
        assert!(serde_json::from_str::<ShopDomain>("\"evil.com\"").is_err());
    }
}
