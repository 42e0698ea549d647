//! Seed the billing plan catalog.
//!
//! Plans are read from a YAML list and matched on name and duration.
//! Existing plans are left alone unless `--replace` is given.

use std::path::Path;

use tracing::{error, info};

use share_cart_app::db;
use share_cart_app::db::BillingRepository;
use share_cart_app::db::billing::PlanUpsert;
use share_cart_app::models::PlanDefinition;
use share_cart_app::services::billing::validate_catalog;

use super::database_url;

/// Parse a YAML plan catalog.
///
/// # Errors
///
/// Returns an error if the document is not a list of plan definitions.
pub fn parse_catalog(content: &str) -> Result<Vec<PlanDefinition>, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Load plans from a YAML file into the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn plans(file_path: &str, replace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading plan catalog");

    // Validate before touching the database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&content)?;
    info!(plans = catalog.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    let repo = BillingRepository::new(&pool);

    let (mut inserted, mut updated, mut skipped) = (0, 0, 0);
    for plan in &catalog {
        match repo.upsert_plan(plan, replace).await? {
            PlanUpsert::Inserted => inserted += 1,
            PlanUpsert::Updated => updated += 1,
            PlanUpsert::Unchanged => skipped += 1,
        }
    }

    info!("Seeding complete!");
    info!("  Plans inserted: {inserted}");
    info!("  Plans updated: {updated}");
    info!("  Plans skipped (already exist): {skipped}");

    Ok(())
}

/// Show row counts for the main tables.
///
/// # Errors
///
/// Returns an error if database connection fails.
pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let counts = BillingRepository::new(&pool).table_counts().await?;

    info!("Share Cart Statistics");
    info!("=====================");
    info!("Plans: {}", counts.plans);
    info!("Subscriptions: {}", counts.subscriptions);
    info!("Coupons: {}", counts.coupons);
    info!("Cart shares: {}", counts.share_events);
    info!("Coupon usages: {}", counts.coupon_usages);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use share_cart_core::{Limit, PlanDuration};

    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = parse_catalog(include_str!("../../plans.yaml")).unwrap();
        assert!(validate_catalog(&catalog).is_empty());

        let free = catalog.iter().find(|p| p.name == "Free").unwrap();
        assert!(free.amount.is_zero());
        assert_eq!(free.permissions.cart_shares, Limit::Unlimited);

        let starter_yearly = catalog
            .iter()
            .find(|p| p.name == "Starter" && p.duration == PlanDuration::Yearly)
            .unwrap();
        assert_eq!(starter_yearly.permissions.live_coupons, Limit::Limited(5));
    }
}
