use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

fn usable(name: &str) -> Option<&str> {
    Some(name).filter(|name| !name.trim().is_empty())
}

/// Fields captured when an item was added from a screen that only knew part
/// of the product record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialProduct {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PartialProduct {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(id),
            name: None,
            price: None,
            aisle: None,
            shelf: None,
            category: None,
            size: None,
            image_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(usable)
    }

    /// Promotes the snapshot to a product when it already carries a name and
    /// a price.
    pub fn to_inline_product(&self) -> Option<Product> {
        let name = self.usable_name()?;
        let price = self.price?;
        Some(Product {
            id: self.id.clone(),
            name: name.to_string(),
            price,
            aisle: self.aisle.clone(),
            shelf: self.shelf.clone(),
            category: self.category.clone(),
            size: self.size.clone(),
            image_url: self.image_url.clone(),
        })
    }

    /// Fields present on the snapshot win; the catalog record fills the rest.
    pub fn merge_onto(&self, base: &Product) -> Product {
        Product {
            id: base.id.clone(),
            name: self.usable_name().map_or_else(|| base.name.clone(), str::to_string),
            price: self.price.unwrap_or(base.price),
            aisle: self.aisle.clone().or_else(|| base.aisle.clone()),
            shelf: self.shelf.clone().or_else(|| base.shelf.clone()),
            category: self.category.clone().or_else(|| base.category.clone()),
            size: self.size.clone().or_else(|| base.size.clone()),
            image_url: self.image_url.clone().or_else(|| base.image_url.clone()),
        }
    }
}

/// One "add to cart" action. Shape depends on the screen that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum CartEntry {
    ById(ProductId),
    Partial(PartialProduct),
    Full(Product),
}

impl CartEntry {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::ById(ProductId::new(id))
    }

    pub fn id(&self) -> &ProductId {
        match self {
            Self::ById(id) => id,
            Self::Partial(partial) => &partial.id,
            Self::Full(product) => &product.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::ById(_) => None,
            Self::Partial(partial) => partial.usable_name(),
            Self::Full(product) => usable(&product.name),
        }
    }

    fn carried_price(&self) -> Option<Decimal> {
        match self {
            Self::ById(_) => None,
            Self::Partial(partial) => partial.price,
            Self::Full(product) => Some(product.price),
        }
    }

    /// Prices are non-negative wherever they come from.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.carried_price() {
            Some(price) if price < Decimal::ZERO => Err(DomainError::InvariantViolation(format!(
                "cart item `{}` has a negative price {price}",
                self.id()
            ))),
            _ => Ok(()),
        }
    }

    /// Returns the product without a catalog lookup when the entry already
    /// carries a name and a price.
    pub fn inline_product(&self) -> Option<Product> {
        match self {
            Self::ById(_) => None,
            Self::Partial(partial) => partial.to_inline_product(),
            Self::Full(product) => usable(&product.name).map(|_| product.clone()),
        }
    }
}

impl From<Product> for CartEntry {
    fn from(value: Product) -> Self {
        Self::Full(value)
    }
}

impl From<PartialProduct> for CartEntry {
    fn from(value: PartialProduct) -> Self {
        Self::Partial(value)
    }
}

impl From<ProductId> for CartEntry {
    fn from(value: ProductId) -> Self {
        Self::ById(value)
    }
}
