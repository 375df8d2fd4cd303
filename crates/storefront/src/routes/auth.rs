//! Sign-in and sign-up pages.
//!
//! The forms post to the JSON endpoints under `/api/auth`; a small script
//! follows the returned `redirectTo` or shows field errors inline.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::layout::NavView;
use crate::middleware::OptionalAuth;
use crate::models::CurrentSession;
use crate::services::access::safe_redirect;
use crate::services::validation::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::state::AppState;

/// `?redirect=` on the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub nav: NavView,
    /// Where to go after signing in; always a relative path.
    pub redirect: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub nav: NavView,
    pub redirect: String,
    pub min_password_length: usize,
    pub max_password_length: usize,
}

/// Display the sign-in page. Signed-in visitors go straight to the target.
pub async fn sign_in_page(
    State(state): State<AppState>,
    session: CurrentSession,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect = safe_redirect(query.redirect.as_deref());
    if user.is_some() {
        return Redirect::to(&redirect).into_response();
    }

    SignInTemplate {
        nav: NavView::for_session(&state, &session).await,
        redirect,
    }
    .into_response()
}

/// Display the sign-up page. Signed-in visitors go straight to the target.
pub async fn sign_up_page(
    State(state): State<AppState>,
    session: CurrentSession,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect = safe_redirect(query.redirect.as_deref());
    if user.is_some() {
        return Redirect::to(&redirect).into_response();
    }

    SignUpTemplate {
        nav: NavView::for_session(&state, &session).await,
        redirect,
        min_password_length: MIN_PASSWORD_LENGTH,
        max_password_length: MAX_PASSWORD_LENGTH,
    }
    .into_response()
}
