//! Seed the catalog from a YAML product list.
//!
//! The file is a list of products in the `NewProduct` shape; prices are
//! quoted decimal strings:
//!
//! ```yaml
//! - name: Air Max 90
//!   brand: Nike
//!   price: "130.00"
//!   category: Running
//!   sizes: ["8", "9", "10"]
//!   colors: [White, Black]
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use tracing::{info, warn};

use footwear_storefront::db::{NewProduct, ProductRepository, RepositoryError};

use super::{CommandError, connect};

/// Bundled catalog, relative to the CLI crate.
pub const DEFAULT_PRODUCTS_FILE: &str = "crates/cli/seed/products.yaml";

/// Counts reported after a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub cleared: u64,
    pub inserted: usize,
    pub skipped: usize,
}

/// Load products from `file_path` into the catalog.
///
/// The file is parsed and checked before connecting. Products that already
/// exist (same name and brand) are skipped, so re-running is safe.
pub async fn products(file_path: &str, clear_existing: bool) -> Result<SeedReport, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading products from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let products = parse_products(&content)?;
    info!(count = products.len(), "Parsed product list");

    let pool = connect().await?;
    let repo = ProductRepository::new(pool);
    let mut report = SeedReport::default();

    if clear_existing {
        report.cleared = repo.clear().await?;
        info!(deleted = report.cleared, "Cleared existing products");
    }

    for product in &products {
        match repo.insert(product).await {
            Ok(id) => {
                info!(product_id = %id, name = %product.name, "Inserted product");
                report.inserted += 1;
            }
            Err(RepositoryError::Conflict(reason)) => {
                warn!(name = %product.name, %reason, "Skipping existing product");
                report.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Product seeding complete"
    );
    Ok(report)
}

/// Parse and check a YAML product list.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, CommandError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(content)?;
    if products.is_empty() {
        return Err(CommandError::InvalidSeed("no products in file".to_string()));
    }
    for (index, product) in products.iter().enumerate() {
        check_product(product).map_err(|reason| {
            CommandError::InvalidSeed(format!("product #{} ({}): {reason}", index + 1, product.name))
        })?;
    }
    Ok(products)
}

fn check_product(product: &NewProduct) -> Result<(), &'static str> {
    if product.name.trim().is_empty() {
        return Err("name is empty");
    }
    if product.brand.trim().is_empty() {
        return Err("brand is empty");
    }
    if product.category.trim().is_empty() {
        return Err("category is empty");
    }
    if product.price < Decimal::ZERO {
        return Err("price is negative");
    }
    if product.discount_percent.is_some_and(|d| d == 0 || d > 100) {
        return Err("discount must be between 1 and 100 percent");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../seed/products.yaml");

    #[test]
    fn test_bundled_catalog_parses() {
        let products = parse_products(BUNDLED).unwrap();
        assert_eq!(products.len(), 6);
        assert!(products.iter().all(|p| p.in_stock));
        assert!(products.iter().any(|p| p.is_best_seller));
    }

    #[test]
    fn test_quoted_price_is_exact() {
        let products = parse_products(
            r#"
- name: Runner
  brand: Acme
  price: "129.99"
  category: Running
"#,
        )
        .unwrap();
        assert_eq!(products.first().unwrap().price, Decimal::new(12999, 2));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(matches!(
            parse_products("[]"),
            Err(CommandError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_bad_discount_is_rejected() {
        let err = parse_products(
            r#"
- name: Runner
  brand: Acme
  price: "100.00"
  category: Running
  discount_percent: 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Runner"));
    }

    #[test]
    fn test_missing_brand_is_a_yaml_error() {
        let err = parse_products(
            r#"
- name: Runner
  price: "100.00"
  category: Running
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Yaml(_)));
    }
}
