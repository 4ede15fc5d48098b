//! Shopper-facing catalog reads: name search, aisle location, scan checks.

use aislefinder_core::scan::NOT_FOUND_MESSAGE;
use aislefinder_core::{
    load_catalog, lookup_scanned, verify_scan, CatalogAccessor, CatalogError, Product, ProductId,
    ProductLocation, ScanVerification,
};
use aislefinder_db::SqlCatalogRepository;
use serde::Serialize;

use crate::commands::{execute, open_store, CommandResult, Failure, EXIT_DB, EXIT_NOT_FOUND};

pub fn search(query: String) -> CommandResult {
    execute("search", |config| async move {
        let pool = open_store(&config).await?;
        let catalog = load_catalog(&SqlCatalogRepository::new(pool.clone())).await;
        pool.close().await;

        let matches = catalog.search(&query).into_iter().cloned().collect::<Vec<_>>();
        let message = format!("{} products match `{}`", matches.len(), query.trim());
        Ok(CommandResult::success_with_data("search", message, &matches))
    })
}

pub fn locate(id: String) -> CommandResult {
    execute("locate", |config| async move {
        let pool = open_store(&config).await?;
        let repository = SqlCatalogRepository::new(pool.clone());
        let fetched = repository.fetch_product(&ProductId::new(id)).await;
        pool.close().await;

        let location = ProductLocation::from(&fetched.map_err(catalog_failure)?);
        let message = match (&location.aisle, &location.shelf) {
            (Some(aisle), Some(shelf)) => {
                format!("{}: aisle {aisle}, shelf {shelf}", location.name)
            }
            _ => format!("{}: location not mapped", location.name),
        };
        Ok(CommandResult::success_with_data("locate", message, &location))
    })
}

#[derive(Debug, Serialize)]
struct MismatchDetail {
    #[serde(flatten)]
    verification: ScanVerification,
    scanned_product: Option<Product>,
}

pub fn verify(id: String, payload: String) -> CommandResult {
    execute("verify", |config| async move {
        let pool = open_store(&config).await?;
        let repository = SqlCatalogRepository::new(pool.clone());

        let outcome = match repository.fetch_product(&ProductId::new(id)).await {
            Ok(expected) => {
                let verification = verify_scan(&expected.id, &payload);
                if verification.is_verified() {
                    Ok(CommandResult::success_with_data(
                        "verify",
                        verification.message(),
                        &verification,
                    ))
                } else {
                    let scanned_product = lookup_scanned(&repository, &payload).await.ok();
                    let detail = MismatchDetail { verification, scanned_product };
                    Ok(mismatch_result(&detail))
                }
            }
            Err(error) => Err(catalog_failure(error)),
        };

        pool.close().await;
        outcome
    })
}

fn mismatch_result(detail: &MismatchDetail) -> CommandResult {
    let mut message = detail.verification.message().to_string();
    if let ScanVerification::Mismatch { scanned, .. } = &detail.verification {
        match &detail.scanned_product {
            Some(product) => {
                message.push_str(&format!(" Scanned `{scanned}` ({}).", product.name));
            }
            None => message.push_str(&format!(" Scanned `{scanned}`.")),
        }
    }
    CommandResult::failure("verify", "verification_mismatch", message, EXIT_NOT_FOUND)
}

pub(crate) fn catalog_failure(error: CatalogError) -> Failure {
    match error {
        CatalogError::NotFound(_) => ("not_found", NOT_FOUND_MESSAGE.to_string(), EXIT_NOT_FOUND),
        CatalogError::Fetch(message) => ("catalog_fetch", message, EXIT_DB),
    }
}
