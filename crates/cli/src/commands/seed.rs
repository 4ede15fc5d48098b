use std::fs;
use std::path::PathBuf;

use aislefinder_db::fixtures::import_documents;
use aislefinder_db::{DbPool, DemoCatalog, SqlCatalogRepository};

use crate::commands::{execute, open_store, CommandResult, Failure, EXIT_MIGRATION};

pub fn run(file: Option<PathBuf>) -> CommandResult {
    execute("seed", |config| async move {
        let pool = open_store(&config).await?;

        let outcome = match file {
            Some(path) => {
                let json = fs::read_to_string(&path).map_err(|error| {
                    let message = format!("cannot read `{}`: {error}", path.display());
                    ("seed_input", message, EXIT_MIGRATION)
                })?;
                let repository = SqlCatalogRepository::new(pool.clone());
                let seeded = import_documents(&repository, &json)
                    .await
                    .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
                Ok(format!(
                    "imported {} products from {}",
                    seeded.product_ids.len(),
                    path.display()
                ))
            }
            None => seed_demo_catalog(&pool).await,
        };

        pool.close().await;
        outcome.map(|message| CommandResult::success("seed", message))
    })
}

async fn seed_demo_catalog(pool: &DbPool) -> Result<String, Failure> {
    let seeded = DemoCatalog::load(pool)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
    let verification = DemoCatalog::verify(pool)
        .await
        .map_err(|error| ("seed_verification", error.to_string(), EXIT_MIGRATION))?;

    if !verification.all_present {
        let message = verification_failure_message(&verification.checks);
        return Err(("seed_verification", message, EXIT_MIGRATION));
    }

    Ok(format!("demo catalog loaded: {} products", seeded.product_ids.len()))
}

fn verification_failure_message(checks: &[(String, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
        .collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
