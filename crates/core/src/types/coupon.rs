//! Coupon, sharing and redemption enums.

use serde::{Deserialize, Serialize};

/// How a coupon's discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "share_cart.discount_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// A fraction of the order subtotal, stored in `(0, 1]`.
    #[default]
    Percentage,
    /// A fixed amount off the order.
    Fixed,
}

/// Which side of a share a redeeming customer was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "share_cart.user_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// The shopper who shared the cart.
    Sender,
    /// The friend who received the shared cart.
    Recipient,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sender => write!(f, "sender"),
            Self::Recipient => write!(f, "recipient"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sender" => Ok(Self::Sender),
            "recipient" | "receiver" => Ok(Self::Recipient),
            _ => Err(format!("invalid user type: {s}")),
        }
    }
}

/// Channel a cart was shared through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "share_cart.share_platform", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Whatsapp,
    Messenger,
    Email,
}

impl SharePlatform {
    /// All platforms, in dashboard display order.
    pub const ALL: [Self; 3] = [Self::Whatsapp, Self::Messenger, Self::Email];

    /// Lower-case key used in JSON payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Messenger => "messenger",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SharePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Self::Whatsapp),
            "messenger" => Ok(Self::Messenger),
            "email" => Ok(Self::Email),
            _ => Err(format!("invalid share platform: {s}")),
        }
    }
}
