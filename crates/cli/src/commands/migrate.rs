//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sc-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/app/migrations/` and are embedded at compile
//! time. The app server never runs them on start-up.

use share_cart_app::db;

use super::{CommandError, database_url};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../app/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
