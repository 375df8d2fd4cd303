//! Checkout page.
//!
//! Shows the signed-in user's cart for review. Payment is out of scope; the
//! page ends at the order summary.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use super::account::UserView;
use super::cart::CartView;
use super::layout::NavView;
use crate::error::Result;
use crate::middleware::auth::RequireAuth;
use crate::models::CartOwner;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub nav: NavView,
    pub user: UserView,
    pub cart: CartView,
}

/// Display the checkout review page.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<impl IntoResponse> {
    let summary = state
        .carts()
        .summary(Some(CartOwner::User(current_user.id)))
        .await?;
    let cart = CartView::from(&summary);

    Ok(CheckoutTemplate {
        nav: NavView {
            user_name: Some(current_user.name.clone()),
            cart_count: cart.item_count,
        },
        user: UserView::from(&current_user),
        cart,
    })
}
