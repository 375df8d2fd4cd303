//! Session state for client-side code.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::Result;
use crate::models::{CurrentSession, CurrentUser};
use crate::state::AppState;

/// Body of `GET /api/session`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
    /// Whether the visitor holds a live guest session.
    pub guest: bool,
    pub cart_count: u32,
}

/// Report the session the guard resolved for this request.
///
/// GET /api/session
pub async fn show(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<SessionResponse>> {
    let cart_count = match session.cart_owner() {
        Some(owner) => state.carts().count(owner).await?,
        None => 0,
    };

    Ok(Json(SessionResponse {
        authenticated: session.is_authenticated(),
        guest: session.guest.is_some(),
        user: session.user,
        cart_count,
    }))
}
