//! Share Cart Core - Domain types library.
//!
//! This crate provides the types shared by the Share Cart components:
//! - `app` - Shopify embedded app server (admin API, webhooks, storefront proxy)
//! - `cli` - Command-line tools for migrations and plan catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - IDs, shop domains, coupon and widget enums, plan limits, timeframes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
