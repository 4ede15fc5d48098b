use async_trait::async_trait;
use tokio::sync::RwLock;

use aislefinder_core::catalog::{CatalogAccessor, CatalogError};
use aislefinder_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};

/// Insertion-ordered catalog for tests and demos.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryCatalogRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalogRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.clone())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogAccessor for InMemoryCatalogRepository {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.list().await?)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.find_by_id(id).await?.ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use aislefinder_core::catalog::{load_catalog, CatalogAccessor, CatalogError};
    use aislefinder_core::domain::product::{Product, ProductId};

    use crate::repositories::{InMemoryCatalogRepository, ProductRepository};

    #[tokio::test]
    async fn in_memory_catalog_round_trip() {
        let repo = InMemoryCatalogRepository::default();
        let product = Product::new("P200", "Corn Flakes", Decimal::new(410, 2));

        repo.save(product.clone()).await.expect("save product");
        let found = repo.find_by_id(&product.id).await.expect("find product");

        assert_eq!(found, Some(product));
    }

    #[tokio::test]
    async fn save_replaces_without_reordering() {
        let repo = InMemoryCatalogRepository::with_products(vec![
            Product::new("A", "Apples", Decimal::ONE),
            Product::new("B", "Bread", Decimal::TWO),
        ]);

        repo.save(Product::new("A", "Green Apples", Decimal::TWO)).await.expect("save");

        let catalog = load_catalog(&repo).await;
        assert_eq!(catalog.products()[0].name, "Green Apples");
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let repo = InMemoryCatalogRepository::default();

        let outcome = repo.fetch_product(&ProductId::new("nope")).await;

        assert_eq!(outcome, Err(CatalogError::NotFound(ProductId::new("nope"))));
    }
}
