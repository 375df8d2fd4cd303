//! Catalog product type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use footwear_core::{Price, ProductId};

/// A product as listed in the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub price: Price,
    pub image_url: Option<String>,
    pub category: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub is_best_seller: bool,
    pub is_sustainable: bool,
    /// Percentage off the list price, if on sale.
    pub discount_percent: Option<u8>,
    pub color_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price after any discount.
    #[must_use]
    pub fn sale_price(&self) -> Price {
        self.discount_percent
            .map_or(self.price, |percent| self.price.discounted(percent))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use super::*;

    /// A minimal in-stock product for tests.
    pub fn product(id: i32, name: &str, cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            brand: "Nike".to_string(),
            description: None,
            price: Price::usd(Decimal::new(cents, 2)),
            image_url: None,
            category: "Running".to_string(),
            sizes: vec!["9".to_string(), "10".to_string()],
            colors: vec!["Black".to_string()],
            in_stock: true,
            is_best_seller: false,
            is_sustainable: false,
            discount_percent: None,
            color_count: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::product;

    #[test]
    fn test_sale_price_applies_discount() {
        let mut p = product(1, "Zoom Fly 5", 16000);
        assert_eq!(p.sale_price().to_string(), "$160.00");
        p.discount_percent = Some(25);
        assert_eq!(p.sale_price().to_string(), "$120.00");
    }
}
