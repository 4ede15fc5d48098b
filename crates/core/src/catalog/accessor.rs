use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use super::Catalog;
use crate::domain::product::{Product, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog fetch failed: {0}")]
    Fetch(String),
    #[error("product `{0}` was not found in the catalog")]
    NotFound(ProductId),
}

/// Read-only access to the remote product catalog.
#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError>;
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError>;
}

#[async_trait]
impl<T> CatalogAccessor for Arc<T>
where
    T: CatalogAccessor + ?Sized,
{
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        (**self).fetch_all_products().await
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        (**self).fetch_product(id).await
    }
}

/// Fetches a catalog snapshot, degrading to an empty catalog on failure.
pub async fn load_catalog<A>(accessor: &A) -> Catalog
where
    A: CatalogAccessor + ?Sized,
{
    match accessor.fetch_all_products().await {
        Ok(products) => Catalog::new(products),
        Err(error) => {
            warn!(
                event_name = "core.catalog.fetch_failed",
                error = %error,
                "catalog fetch failed; continuing with an empty catalog"
            );
            Catalog::default()
        }
    }
}
