//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (storefront-facing routes only)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, OAuth state)
//!
//! Merchant API routes authenticate per handler through [`ShopSession`].
//! JSON bodies are read through [`ApiJson`].

pub mod json;
pub mod session;
pub mod shop_session;

pub use json::ApiJson;
pub use session::create_session_layer;
pub use shop_session::{AuthError, ShopSession};
