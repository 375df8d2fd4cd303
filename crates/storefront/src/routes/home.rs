//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use super::layout::NavView;
use super::products::ProductView;
use crate::error::Result;
use crate::models::CurrentSession;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub featured: Vec<ProductView>,
}

/// Display the home page: best sellers first, then the rest of the catalog.
pub async fn home(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<impl IntoResponse> {
    let products = state.catalog().list_products().await?;

    let featured = products
        .iter()
        .filter(|p| p.is_best_seller)
        .chain(products.iter().filter(|p| !p.is_best_seller))
        .take(FEATURED_COUNT)
        .map(ProductView::from)
        .collect();

    Ok(HomeTemplate {
        nav: NavView::for_session(&state, &session).await,
        featured,
    })
}
