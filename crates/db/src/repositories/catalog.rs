use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use aislefinder_core::catalog::{CatalogAccessor, CatalogError};
use aislefinder_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, price, aisle, shelf, category, size, image_url";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_price(id: &str, raw: Option<String>) -> Result<Decimal, RepositoryError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(value) => Decimal::from_str(value).map_err(|e| {
            RepositoryError::Decode(format!("product `{id}` has invalid price `{value}`: {e}"))
        }),
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = decode(row, "id")?;
    let price = parse_price(&id, decode(row, "price")?)?;

    Ok(Product {
        id: ProductId(id),
        name: decode(row, "name")?,
        price,
        aisle: decode(row, "aisle")?,
        shelf: decode(row, "shelf")?,
        category: decode(row, "category")?,
        size: decode(row, "size")?,
        image_url: decode(row, "image_url")?,
    })
}

#[async_trait]
impl ProductRepository for SqlCatalogRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, name, price, aisle, shelf, category, size, image_url)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 aisle = excluded.aisle,
                 shelf = excluded.shelf,
                 category = excluded.category,
                 size = excluded.size,
                 image_url = excluded.image_url,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.to_string())
        .bind(&product.aisle)
        .bind(&product.shelf)
        .bind(&product.category)
        .bind(&product.size)
        .bind(&product.image_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogAccessor for SqlCatalogRepository {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.list().await?)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.find_by_id(id).await?.ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}
