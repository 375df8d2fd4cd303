//! Product catalog repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use footwear_core::{Price, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, name, brand, description, price, image_url, category, \
     sizes, colors, in_stock, is_best_seller, is_sustainable, discount_percent, color_count, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    brand: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    category: String,
    sizes: Vec<String>,
    colors: Vec<String>,
    in_stock: bool,
    is_best_seller: bool,
    is_sustainable: bool,
    discount_percent: Option<i16>,
    color_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let discount_percent = row
            .discount_percent
            .map(|d| {
                u8::try_from(d).ok().filter(|d| *d <= 100).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "invalid discount {d} for product {}",
                        row.id
                    ))
                })
            })
            .transpose()?;
        let color_count = u32::try_from(row.color_count).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative color count for product {}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            description: row.description,
            price: Price::usd(row.price),
            image_url: row.image_url,
            category: row.category,
            sizes: row.sizes,
            colors: row.colors,
            in_stock: row.in_stock,
            is_best_seller: row.is_best_seller,
            is_sustainable: row.is_sustainable,
            discount_percent,
            color_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A catalog entry to insert, as read from a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub is_sustainable: bool,
    #[serde(default)]
    pub discount_percent: Option<u8>,
    #[serde(default)]
    pub color_count: Option<u32>,
}

const fn default_in_stock() -> bool {
    true
}

/// `PostgreSQL` repository for `storefront.product`.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if a product with the same name
    /// and brand already exists.
    pub async fn insert(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        // Unless given explicitly, the color count is the number of listed colors.
        let color_count = product
            .color_count
            .unwrap_or_else(|| u32::try_from(product.colors.len()).unwrap_or(u32::MAX));
        let color_count = i32::try_from(color_count).unwrap_or(i32::MAX);

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product (
                name, brand, description, price, image_url, category, sizes, colors,
                in_stock, is_best_seller, is_sustainable, discount_percent, color_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.in_stock)
        .bind(product.is_best_seller)
        .bind(product.is_sustainable)
        .bind(product.discount_percent.map(i16::from))
        .bind(color_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_insert(
                e,
                &format!("product {} by {} already exists", product.name, product.brand),
            )
        })?;

        Ok(id)
    }

    /// Delete every product. Cart lines referencing them cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }
}
