//! Cart route handlers.
//!
//! Carts belong to the signed-in user, or else to the visitor's guest
//! session. Adding to cart without either starts a guest session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use footwear_core::ProductId;

use super::layout::NavView;
use super::products::ProductView;
use crate::error::{Result, add_breadcrumb};
use crate::models::{CartSummary, CurrentSession};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone, Debug)]
pub struct CartLineView {
    pub product: ProductView,
    pub quantity: u32,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&CartSummary> for CartView {
    fn from(summary: &CartSummary) -> Self {
        Self {
            lines: summary
                .lines
                .iter()
                .map(|line| CartLineView {
                    product: ProductView::from(&line.product),
                    quantity: line.quantity,
                    line_price: line.line_total.to_string(),
                })
                .collect(),
            subtotal: summary.subtotal.to_string(),
            item_count: summary.item_count,
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: CartView,
    pub signed_in: bool,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Display the cart page.
pub async fn show(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<impl IntoResponse> {
    let summary = state.carts().summary(session.cart_owner()).await?;
    let cart = CartView::from(&summary);

    Ok(CartShowTemplate {
        nav: NavView {
            user_name: session.user.as_ref().map(|u| u.name.clone()),
            cart_count: cart.item_count,
        },
        cart,
        signed_in: session.is_authenticated(),
    })
}

/// Add a product to the cart and return to the cart page.
#[instrument(skip(state, session, jar))]
pub async fn add(
    State(state): State<AppState>,
    session: CurrentSession,
    jar: CookieJar,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let (jar, item) = state
        .carts()
        .add(&session, jar, product_id, form.quantity)
        .await?;

    let product_id = product_id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::info!(quantity = item.quantity, "Product added to cart");

    Ok((jar, Redirect::to("/cart")).into_response())
}
