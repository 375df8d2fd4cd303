//! Cart domain types.

use serde::Serialize;

use footwear_core::{CurrencyCode, Price, ProductId, SessionToken, UserId};

use super::product::Product;

/// Who a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// An anonymous visitor, identified by their guest session.
    Guest(SessionToken),
    /// A registered user.
    User(UserId),
}

/// One product line in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart line joined with its product, for display.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Price,
}

/// A priced cart.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub item_count: u32,
}

impl CartSummary {
    /// Price `items` against the catalog. Items whose product no longer
    /// exists are skipped.
    #[must_use]
    pub fn build(items: &[CartItem], products: &[Product]) -> Self {
        let lines: Vec<CartLine> = items
            .iter()
            .filter_map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id)?;
                Some(CartLine {
                    line_total: product.sale_price().times(item.quantity),
                    product: product.clone(),
                    quantity: item.quantity,
                })
            })
            .collect();

        let currency = lines
            .first()
            .map_or(CurrencyCode::default(), |l| l.line_total.currency_code);
        let subtotal = lines.iter().fold(Price::zero(currency), |acc, line| {
            Price::new(acc.amount + line.line_total.amount, currency)
        });
        let item_count = lines.iter().map(|l| l.quantity).sum();

        Self {
            lines,
            subtotal,
            item_count,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
