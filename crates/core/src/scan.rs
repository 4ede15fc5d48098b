use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogAccessor, CatalogError};
use crate::domain::product::{Product, ProductId};

pub const VERIFIED_MESSAGE: &str = "Product Verified! The IDs match.";
pub const MISMATCH_MESSAGE: &str = "Product Mismatch! The IDs do not match.";
pub const NOT_FOUND_MESSAGE: &str = "Product not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanVerification {
    Verified { product_id: ProductId },
    Mismatch { expected: ProductId, scanned: String },
}

impl ScanVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Verified { .. } => VERIFIED_MESSAGE,
            Self::Mismatch { .. } => MISMATCH_MESSAGE,
        }
    }

    pub fn into_result(self) -> Result<ProductId, VerificationError> {
        match self {
            Self::Verified { product_id } => Ok(product_id),
            Self::Mismatch { expected, scanned } => {
                Err(VerificationError::Mismatch { expected, scanned })
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("scanned `{scanned}` does not match expected product `{expected}`")]
    Mismatch { expected: ProductId, scanned: String },
}

/// Compares a decoded scanner payload with the product the shopper is viewing.
pub fn verify_scan(expected: &ProductId, payload: &str) -> ScanVerification {
    let scanned = payload.trim();
    if scanned == expected.as_str() {
        ScanVerification::Verified { product_id: expected.clone() }
    } else {
        ScanVerification::Mismatch { expected: expected.clone(), scanned: scanned.to_string() }
    }
}

/// Resolves a decoded payload to the catalog product it names.
pub async fn lookup_scanned<A>(accessor: &A, payload: &str) -> Result<Product, CatalogError>
where
    A: CatalogAccessor + ?Sized,
{
    let id = ProductId::new(payload.trim());
    if id.as_str().is_empty() {
        return Err(CatalogError::NotFound(id));
    }
    accessor.fetch_product(&id).await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::{lookup_scanned, verify_scan, ScanVerification, VerificationError};
    use crate::catalog::{CatalogAccessor, CatalogError};
    use crate::domain::product::{Product, ProductId};

    struct OneProduct;

    #[async_trait]
    impl CatalogAccessor for OneProduct {
        async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
            Ok(vec![Product::new("P100", "Whole Milk", Decimal::new(299, 2))])
        }

        async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
            match id.as_str() {
                "P100" => Ok(Product::new("P100", "Whole Milk", Decimal::new(299, 2))),
                _ => Err(CatalogError::NotFound(id.clone())),
            }
        }
    }

    #[test]
    fn matching_payload_is_verified() {
        let outcome = verify_scan(&ProductId::new("P100"), " P100\n");

        assert!(outcome.is_verified());
        assert_eq!(outcome.message(), "Product Verified! The IDs match.");
    }

    #[test]
    fn different_payload_is_a_mismatch() {
        let outcome = verify_scan(&ProductId::new("P100"), "P200");

        assert_eq!(outcome.message(), "Product Mismatch! The IDs do not match.");
        assert_eq!(
            outcome.into_result(),
            Err(VerificationError::Mismatch {
                expected: ProductId::new("P100"),
                scanned: "P200".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn lookup_finds_scanned_product() {
        let product = lookup_scanned(&OneProduct, "P100 ").await.expect("known product");
        assert_eq!(product.name, "Whole Milk");
    }

    #[tokio::test]
    async fn lookup_reports_unknown_and_blank_payloads_as_not_found() {
        let unknown = lookup_scanned(&OneProduct, "P404").await;
        assert_eq!(unknown, Err(CatalogError::NotFound(ProductId::new("P404"))));

        let blank = lookup_scanned(&OneProduct, "   ").await;
        assert!(matches!(blank, Err(CatalogError::NotFound(_))));
    }
}
