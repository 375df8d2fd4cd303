//! Read-only catalog API.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// List every product in the catalog.
///
/// GET /api/products
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(products.to_vec()))
}
