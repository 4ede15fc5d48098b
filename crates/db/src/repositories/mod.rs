use async_trait::async_trait;
use thiserror::Error;

use aislefinder_core::catalog::CatalogError;
use aislefinder_core::domain::product::{Product, ProductId};

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CatalogError {
    fn from(value: RepositoryError) -> Self {
        CatalogError::Fetch(value.to_string())
    }
}

/// Catalog persistence. Writes exist only for seeding; the shopping flow reads
/// through [`aislefinder_core::catalog::CatalogAccessor`].
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}
