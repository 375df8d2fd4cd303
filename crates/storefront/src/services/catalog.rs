//! Product catalog with an in-memory cache.
//!
//! The catalog is read-only at runtime (it changes only through
//! `fw-cli seed`), so listings and single products are cached with `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use footwear_core::ProductId;

use crate::db::{ProductStore, RepositoryError};
use crate::models::Product;

#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Cached read access to the product catalog.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ProductStore>,
    cache: Cache<String, CacheValue>,
}

impl CatalogService {
    /// Cache entries live for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { store, cache }
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails on a cache miss.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let cache_key = "products:all".to_string();

        if let Some(CacheValue::Products(products)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(self.store.list_products().await?);
        self.cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// A single product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails on a cache miss.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let Some(product) = self.store.find_product(id).await? else {
            return Ok(None);
        };
        self.cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::product::fixtures::product;

    #[tokio::test]
    async fn test_lists_and_finds_products() {
        let store = Arc::new(MemoryStore::with_products(vec![
            product(1, "Air Max 90", 12000),
            product(2, "Pegasus 40", 13000),
        ]));
        let catalog = CatalogService::new(store, Duration::from_secs(60));

        assert_eq!(catalog.list_products().await.unwrap().len(), 2);
        // Served from cache the second time.
        assert_eq!(catalog.list_products().await.unwrap().len(), 2);

        let found = catalog.get_product(ProductId::new(2)).await.unwrap().unwrap();
        assert_eq!(found.name, "Pegasus 40");
        assert!(catalog.get_product(ProductId::new(9)).await.unwrap().is_none());
    }
}
