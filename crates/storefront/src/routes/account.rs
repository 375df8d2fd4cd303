//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use super::layout::NavView;
use crate::error::Result;
use crate::middleware::auth::RequireAuth;
use crate::models::{CartOwner, CurrentUser};
use crate::state::AppState;

/// User display data for templates.
#[derive(Clone, Debug)]
pub struct UserView {
    pub email: String,
    pub name: String,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            email: user.email.to_string(),
            name: user.name.clone(),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub nav: NavView,
    pub user: UserView,
}

/// Display account overview page.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<impl IntoResponse> {
    let cart_count = state.carts().count(CartOwner::User(current_user.id)).await?;

    Ok(AccountIndexTemplate {
        nav: NavView {
            user_name: Some(current_user.name.clone()),
            cart_count,
        },
        user: UserView::from(&current_user),
    })
}
