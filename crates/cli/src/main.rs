//! Share Cart CLI - Database migrations and plan catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sc-cli migrate
//!
//! # Load the billing plan catalog (skips plans that already exist)
//! sc-cli seed plans crates/cli/plans.yaml
//!
//! # Overwrite existing plans with the file's values
//! sc-cli seed plans crates/cli/plans.yaml --replace
//!
//! # Row counts
//! sc-cli seed stats
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Share Cart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load billing plans from a YAML catalog
    Plans {
        /// Path to the catalog file
        path: String,

        /// Update plans that already exist instead of skipping them
        #[arg(long)]
        replace: bool,
    },
    /// Show row counts for the main tables
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Plans { path, replace } => commands::seed::plans(&path, replace).await?,
            SeedTarget::Stats => commands::seed::stats().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_plans() {
        let cli = Cli::try_parse_from(["sc-cli", "seed", "plans", "plans.yaml", "--replace"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed {
                target: SeedTarget::Plans { replace: true, .. }
            })
        ));
    }
}
