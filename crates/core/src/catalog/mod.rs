//! In-memory catalog snapshot: id index, name search, aisle lookup, and the
//! featured sample used when no recommendations survive validation.

mod accessor;

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

pub use accessor::{load_catalog, CatalogAccessor, CatalogError};

/// Id lookup over a catalog snapshot.
pub trait ProductLookup {
    fn lookup(&self, id: &ProductId) -> Option<&Product>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLocation {
    pub product_id: ProductId,
    pub name: String,
    pub aisle: Option<String>,
    pub shelf: Option<String>,
}

impl ProductLocation {
    pub fn is_mapped(&self) -> bool {
        self.aisle.is_some() && self.shelf.is_some()
    }
}

impl From<&Product> for ProductLocation {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            aisle: product.aisle.clone(),
            shelf: product.shelf.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
    lowercase_names: Vec<String>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Builds the id index once. When the store returns the same id twice the
    /// first record wins.
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            index.entry(product.id.clone()).or_insert(position);
        }
        let lowercase_names = products.iter().map(|product| product.name.to_lowercase()).collect();

        Self { products, lowercase_names, index }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|position| self.products.get(*position))
    }

    /// Case-insensitive substring search on product names, in catalog order.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .zip(&self.lowercase_names)
            .filter(|(_, name)| name.contains(&needle))
            .map(|(product, _)| product)
            .collect()
    }

    /// First product whose name contains `fragment`, ignoring case.
    pub fn first_name_match(&self, fragment: &str) -> Option<&Product> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.products
            .iter()
            .zip(&self.lowercase_names)
            .find(|(_, name)| name.contains(&needle))
            .map(|(product, _)| product)
    }

    pub fn locate(&self, id: &ProductId) -> Option<ProductLocation> {
        self.find(id).map(ProductLocation::from)
    }

    /// Random sample of products that have an image reference.
    pub fn sample_with_images<R>(&self, count: usize, rng: &mut R) -> Vec<Product>
    where
        R: Rng + ?Sized,
    {
        let with_images =
            self.products.iter().filter(|product| product.has_image()).collect::<Vec<_>>();
        with_images.choose_multiple(rng, count).map(|product| (*product).clone()).collect()
    }
}

impl ProductLookup for Catalog {
    fn lookup(&self, id: &ProductId) -> Option<&Product> {
        self.find(id)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    use super::Catalog;
    use crate::domain::product::{Product, ProductId};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new("P1", "Whole Milk", Decimal::new(299, 2))
                .with_location("3", "2")
                .with_image("milk.png"),
            Product::new("P2", "Skimmed Milk", Decimal::new(279, 2)).with_location("3", "3"),
            Product::new("P3", "Strawberry Jam", Decimal::new(450, 2)).with_image("jam.png"),
            Product::new("P4", "Butter", Decimal::new(399, 2)).with_image("butter.png"),
        ])
    }

    #[test]
    fn search_is_case_insensitive_and_keeps_catalog_order() {
        let catalog = catalog();
        let names = catalog.search("  MILK ").iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Whole Milk", "Skimmed Milk"]);
    }

    #[test]
    fn blank_search_returns_nothing() {
        assert!(catalog().search("   ").is_empty());
    }

    #[test]
    fn first_name_match_picks_earliest_product() {
        let catalog = catalog();
        let matched = catalog.first_name_match("milk").expect("milk should match");
        assert_eq!(matched.id, ProductId::new("P1"));
        assert!(catalog.first_name_match("unicorn").is_none());
        assert!(catalog.first_name_match("").is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let catalog = Catalog::new(vec![
            Product::new("P1", "First", Decimal::ONE),
            Product::new("P1", "Second", Decimal::TWO),
        ]);
        assert_eq!(catalog.find(&ProductId::new("P1")).map(|p| p.name.as_str()), Some("First"));
    }

    #[test]
    fn locate_reports_aisle_and_shelf() {
        let location = catalog().locate(&ProductId::new("P2")).expect("product should exist");
        assert_eq!(location.aisle.as_deref(), Some("3"));
        assert_eq!(location.shelf.as_deref(), Some("3"));
        assert!(location.is_mapped());

        let unmapped = catalog().locate(&ProductId::new("P4")).expect("product should exist");
        assert!(!unmapped.is_mapped());
    }

    #[test]
    fn featured_sample_only_uses_products_with_images() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = catalog().sample_with_images(10, &mut rng);

        assert_eq!(sample.len(), 3);
        assert!(sample.iter().all(Product::has_image));
    }

    #[test]
    fn featured_sample_respects_requested_size() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(catalog().sample_with_images(2, &mut rng).len(), 2);
    }
}
