//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use footwear_core::ProductId;

use super::layout::NavView;
use crate::error::{AppError, Result};
use crate::models::{CurrentSession, Product};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone, Debug)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: Option<String>,
    pub category: String,
    /// Price actually charged.
    pub price: String,
    /// List price, shown struck through when on sale.
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u8>,
    pub image_url: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub color_count: u32,
    pub in_stock: bool,
    pub is_best_seller: bool,
    pub is_sustainable: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let sale_price = product.sale_price();
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: sale_price.to_string(),
            compare_at_price: (sale_price != product.price).then(|| product.price.to_string()),
            discount_percent: product.discount_percent,
            image_url: product.image_url.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.clone(),
            color_count: product.color_count,
            in_stock: product.in_stock,
            is_best_seller: product.is_best_seller,
            is_sustainable: product.is_sustainable,
        }
    }
}

/// A category link on the listing page.
#[derive(Clone, Debug)]
pub struct CategoryOption {
    pub name: String,
    pub selected: bool,
}

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: NavView,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryOption>,
    pub filtered: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: NavView,
    pub product: ProductView,
}

/// Display the product listing, optionally filtered by category.
pub async fn index(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let all = state.catalog().list_products().await?;

    let category = query.category.filter(|c| !c.trim().is_empty());

    let mut names: Vec<&str> = all.iter().map(|p| p.category.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    let categories = names
        .into_iter()
        .map(|name| CategoryOption {
            name: name.to_string(),
            selected: category
                .as_deref()
                .is_some_and(|c| name.eq_ignore_ascii_case(c)),
        })
        .collect();
    let products = all
        .iter()
        .filter(|p| {
            category
                .as_deref()
                .is_none_or(|c| p.category.eq_ignore_ascii_case(c))
        })
        .map(ProductView::from)
        .collect();

    Ok(ProductsIndexTemplate {
        nav: NavView::for_session(&state, &session).await,
        products,
        categories,
        filtered: category.is_some(),
    })
}

/// Display a product detail page.
pub async fn show(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("product {id}"));
    let product_id: ProductId = id.parse().map_err(|_| not_found())?;
    let product = state
        .catalog()
        .get_product(product_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ProductShowTemplate {
        nav: NavView::for_session(&state, &session).await,
        product: ProductView::from(&product),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::fixtures::product;

    #[test]
    fn test_product_view_shows_compare_at_price_only_on_sale() {
        let mut p = product(1, "Pegasus 41", 14000);
        let view = ProductView::from(&p);
        assert_eq!(view.price, "$140.00");
        assert_eq!(view.compare_at_price, None);

        p.discount_percent = Some(10);
        let view = ProductView::from(&p);
        assert_eq!(view.price, "$126.00");
        assert_eq!(view.compare_at_price.as_deref(), Some("$140.00"));
    }
}
