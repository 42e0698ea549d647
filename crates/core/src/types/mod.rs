//! Core types for Share Cart.
//!
//! This module provides type-safe wrappers for the app's domain concepts.

pub mod coupon;
pub mod id;
pub mod plan;
pub mod shop;
pub mod timeframe;
pub mod widget;

pub use coupon::{DiscountKind, SharePlatform, UserType};
pub use id::*;
pub use plan::{Limit, PlanDuration, PlanPermissions, SubscriptionStatus};
pub use shop::{ShopDomain, ShopDomainError};
pub use timeframe::Timeframe;
pub use widget::{ButtonStyle, WidgetColors, WidgetPlacement};
