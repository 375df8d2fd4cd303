//! Email/password authentication API.
//!
//! Form-encoded requests, JSON responses of the shape
//! `{success, user?, error?, fieldErrors?, warnings?, redirectTo?}`.
//! Input is validated before any store or authenticator call; a successful
//! sign-in or sign-up sets the auth cookie and merges the guest cart.

use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::CurrentUser;
use crate::models::session::session_ttl;
use crate::services::access::safe_redirect;
use crate::services::auth::Authenticated;
use crate::services::validation::{ValidationErrors, validate_sign_in, validate_sign_up};
use crate::services::{AuthError, CookieKind, MergeOutcome};
use crate::state::AppState;

/// Sign-in form.
///
/// Missing fields deserialize as empty strings so the validator reports
/// them per field.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub redirect: Option<String>,
}

/// Sign-up form.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    pub redirect: Option<String>,
}

/// JSON body of every auth endpoint.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<&'static str, Vec<String>>>,
    /// Advisory password rules the new password broke.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl AuthResponse {
    fn failure(err: AppError) -> Response {
        err.report();
        let field_errors = match &err {
            AppError::Auth(AuthError::Validation(errors)) => Some(errors.by_field()),
            _ => None,
        };
        let body = Self {
            error: Some(err.public_message()),
            field_errors,
            ..Self::default()
        };
        (err.status(), Json(body)).into_response()
    }

    fn invalid(errors: ValidationErrors) -> Response {
        Self::failure(AuthError::Validation(errors).into())
    }

    /// A body the form extractor could not read (wrong content type,
    /// malformed encoding).
    fn rejected(rejection: &FormRejection) -> Response {
        tracing::debug!(error = %rejection, "Rejected auth form");
        let body = Self {
            error: Some(rejection.body_text()),
            ..Self::default()
        };
        (rejection.status(), Json(body)).into_response()
    }
}

/// Sign in with email and password.
///
/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<SignInForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return AuthResponse::rejected(&rejection),
    };
    let input = match validate_sign_in(&form.email, &form.password) {
        Ok(input) => input,
        Err(errors) => return AuthResponse::invalid(errors),
    };

    match state.auth().sign_in(&input).await {
        Ok(authenticated) => {
            complete(&state, jar, authenticated, Vec::new(), form.redirect.as_deref()).await
        }
        Err(e) => AuthResponse::failure(e.into()),
    }
}

/// Create an account and sign in.
///
/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<SignUpForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return AuthResponse::rejected(&rejection),
    };
    let policy = &state.config().password_policy;
    let input = match validate_sign_up(&form.email, &form.name, &form.password, policy) {
        Ok(input) => input,
        Err(errors) => return AuthResponse::invalid(errors),
    };
    let warnings = input.warnings.iter().map(|w| w.message.clone()).collect();

    match state.auth().sign_up(&input).await {
        Ok(authenticated) => {
            complete(&state, jar, authenticated, warnings, form.redirect.as_deref()).await
        }
        Err(e) => AuthResponse::failure(e.into()),
    }
}

/// Shared tail of sign-in and sign-up: auth cookie, guest cart merge,
/// Sentry user context.
async fn complete(
    state: &AppState,
    jar: CookieJar,
    authenticated: Authenticated,
    warnings: Vec<String>,
    redirect: Option<&str>,
) -> Response {
    let Authenticated { user, session } = authenticated;

    let jar = state
        .cookies()
        .issue(jar, CookieKind::Auth, session.token, session_ttl());
    let (jar, outcome) = state.merger().merge(user.id, jar).await;
    if let MergeOutcome::Merged { lines } = outcome {
        let lines = lines.to_string();
        add_breadcrumb("cart", "Guest cart merged", Some(&[("lines", lines.as_str())]));
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));

    let body = AuthResponse {
        success: true,
        user: Some(CurrentUser::from(&user)),
        warnings,
        redirect_to: Some(safe_redirect(redirect)),
        ..AuthResponse::default()
    };
    (jar, Json(body)).into_response()
}

/// End the current session.
///
/// POST /api/auth/sign-out
///
/// Always succeeds from the client's point of view; cookies are cleared
/// even if the store could not be reached. A leftover guest session is
/// ended too.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    let cookies = state.cookies();

    if let Some(token) = cookies.read(&jar, CookieKind::Auth) {
        if let Err(e) = state.auth().sign_out(token).await {
            AppError::from(e).report();
        }
    }
    if let Some(token) = cookies.read(&jar, CookieKind::Guest) {
        if let Err(e) = state.guests().delete(token).await {
            AppError::from(e).report();
        }
    }

    let jar = [CookieKind::Auth, CookieKind::Guest]
        .into_iter()
        .fold(jar, |jar, kind| {
            if cookies.is_present(&jar, kind) {
                cookies.clear(jar, kind)
            } else {
                jar
            }
        });
    clear_sentry_user();

    let body = AuthResponse {
        success: true,
        redirect_to: Some("/".to_string()),
        ..AuthResponse::default()
    };
    (StatusCode::OK, jar, Json(body)).into_response()
}
