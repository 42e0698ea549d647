//! Share Cart app library.
//!
//! Backend of an embedded Shopify app that lets shoppers share their cart
//! and rewards the share with a discount code. The crate is exposed as a
//! library so the CLI and integration tests can reuse its repositories,
//! services and Shopify helpers.
//!
//! # Surfaces
//!
//! - Merchant API behind App Bridge session tokens
//! - Public storefront endpoints (shares, redemptions, app proxy)
//! - Shopify OAuth install and webhooks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
