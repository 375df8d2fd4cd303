//! Data shared by every page layout.

use crate::models::CurrentSession;
use crate::state::AppState;

/// Navigation bar state for `base.html`.
#[derive(Clone, Debug, Default)]
pub struct NavView {
    /// Display name of the signed-in user.
    pub user_name: Option<String>,
    pub cart_count: u32,
}

impl NavView {
    /// Build the navigation for this request's session.
    ///
    /// A failing cart lookup shows an empty badge rather than failing the
    /// page.
    pub async fn for_session(state: &AppState, session: &CurrentSession) -> Self {
        let cart_count = match session.cart_owner() {
            Some(owner) => state.carts().count(owner).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to count cart items");
                0
            }),
            None => 0,
        };

        Self {
            user_name: session.user.as_ref().map(|u| u.name.clone()),
            cart_count,
        }
    }
}
