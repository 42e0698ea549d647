//! Business logic between the HTTP handlers and the repositories.
//!
//! Pure pieces (validation, reconciliation planning, dashboard aggregation)
//! are plain functions so they can be tested without a database or Shopify.

pub mod billing;
pub mod coupons;
pub mod dashboard;
pub mod reconcile;
pub mod widget_sync;

use thiserror::Error;

/// Input rejected before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Coupon name is required")]
    MissingName,

    #[error("You must select at least one product or collection for the discount to apply.")]
    NoDiscountTargets,

    #[error("Percentage value must be between 0.0 and 1.0 (0% - 100%)")]
    PercentageOutOfRange,

    #[error("Percentage value can have at most two decimal places (e.g. 12.5%)")]
    PercentagePrecision,

    #[error("Fixed amount must be greater than zero")]
    InvalidFixedAmount,

    #[error("Minimum purchase amount must be greater than zero")]
    InvalidMinimumPurchase,

    #[error("End date must be after the start date")]
    EndBeforeStart,

    #[error("Select at least one widget placement")]
    NoPlacements,

    #[error("Widget placement {0} is listed more than once")]
    DuplicatePlacement(String),

    #[error("Invalid shared cart: {0}")]
    InvalidCart(String),
}
