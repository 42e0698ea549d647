//! Domain models for the app.
//!
//! Models are what repositories return and handlers serialize. Request
//! bodies live beside the model they create or update.

pub mod analytics;
pub mod billing;
pub mod coupon;
pub mod widget;

pub use analytics::{CouponActivity, CouponUsage, NewCouponUsage, NewShareEvent, ShareEvent};
pub use billing::{Plan, PlanDefinition, ShopSubscription, SubscriptionWithPlan};
pub use coupon::{Coupon, CouponSummary, CreateCouponRequest, NewCoupon, UpdateCouponRequest};
pub use widget::{SaveWidgetRequest, Widget, WidgetWithCoupon};
