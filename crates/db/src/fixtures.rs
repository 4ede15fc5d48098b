use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use aislefinder_core::domain::product::{Product, ProductId};

use crate::connection::DbPool;
use crate::repositories::{ProductRepository, RepositoryError, SqlCatalogRepository};

/// A catalog document as exported from the store: the key is the product id.
#[derive(Debug, Deserialize)]
struct ProductDocument {
    name: String,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    aisle: Option<String>,
    #[serde(default)]
    shelf: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default, alias = "img")]
    image_url: Option<String>,
}

impl ProductDocument {
    fn into_product(self, id: String) -> Product {
        Product {
            id: ProductId(id),
            name: self.name,
            price: self.price.unwrap_or(Decimal::ZERO),
            aisle: self.aisle,
            shelf: self.shelf,
            category: self.category,
            size: self.size,
            image_url: self.image_url,
        }
    }
}

/// Parses a JSON object of `{ "<id>": { name, price, aisle, ... } }` documents.
///
/// Products come back ordered by id so repeated imports are deterministic.
pub fn parse_catalog_documents(json: &str) -> Result<Vec<Product>, RepositoryError> {
    let documents: BTreeMap<String, ProductDocument> = serde_json::from_str(json)
        .map_err(|error| RepositoryError::Decode(format!("catalog documents: {error}")))?;

    Ok(documents.into_iter().map(|(id, document)| document.into_product(id)).collect())
}

/// Imports catalog documents through any repository, replacing same-id rows.
pub async fn import_documents<R>(repository: &R, json: &str) -> Result<SeedResult, RepositoryError>
where
    R: ProductRepository + ?Sized,
{
    let products = parse_catalog_documents(json)?;
    let mut product_ids = Vec::with_capacity(products.len());

    for product in products {
        product_ids.push(product.id.clone());
        repository.save(product).await?;
    }

    info!(
        event_name = "db.fixtures.imported",
        products = product_ids.len(),
        "catalog documents imported"
    );
    Ok(SeedResult { product_ids })
}

/// Deterministic grocery catalog for demos and end-to-end checks.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const JSON: &str = include_str!("../../../config/fixtures/demo_catalog.json");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repository = SqlCatalogRepository::new(pool.clone());
        import_documents(&repository, Self::JSON).await
    }

    /// Checks that every demo product is present with its seeded name and price.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let repository = SqlCatalogRepository::new(pool.clone());
        let mut checks = Vec::new();

        for expected in parse_catalog_documents(Self::JSON)? {
            let present = repository.find_by_id(&expected.id).await?.is_some_and(|stored| {
                stored.name == expected.name && stored.price == expected.price
            });
            checks.push((expected.id.to_string(), present));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for product in parse_catalog_documents(Self::JSON)? {
            sqlx::query("DELETE FROM product WHERE id = ?")
                .bind(product.id.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub product_ids: Vec<ProductId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{import_documents, parse_catalog_documents, DemoCatalog};
    use crate::repositories::{InMemoryCatalogRepository, ProductRepository, RepositoryError};

    #[test]
    fn documents_are_keyed_by_id_and_missing_price_is_zero() {
        let products = parse_catalog_documents(
            r#"{
                "P2": {"name": "Tote Bag"},
                "P1": {"name": "Whole Milk", "price": 2.99, "aisle": "A1", "shelf": "2", "img": "milk.jpg"}
            }"#,
        )
        .expect("parse");

        assert_eq!(products[0].id.as_str(), "P1");
        assert_eq!(products[0].price, Decimal::new(299, 2));
        assert_eq!(products[0].image_url.as_deref(), Some("milk.jpg"));
        assert_eq!(products[1].price, Decimal::ZERO);
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let outcome = parse_catalog_documents(r#"[{"name": "Milk"}]"#);
        assert!(matches!(outcome, Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn demo_catalog_parses() {
        let products = parse_catalog_documents(DemoCatalog::JSON).expect("demo catalog");
        assert!(products.len() >= 10);
        assert!(products.iter().any(|product| product.image_url.is_none()));
    }

    #[tokio::test]
    async fn import_goes_through_any_repository() {
        let repo = InMemoryCatalogRepository::default();

        let seeded = import_documents(&repo, DemoCatalog::JSON).await.expect("import");

        assert_eq!(repo.list().await.expect("list").len(), seeded.product_ids.len());
    }
}
