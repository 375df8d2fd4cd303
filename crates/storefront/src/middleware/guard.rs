//! Route access guard.
//!
//! Wraps every page and API route. For each request it:
//!
//! 1. Resolves the session cookies (see [`super::session`])
//! 2. Outside the bypass prefixes, gives visitors with neither an auth
//!    cookie nor a live guest session a new guest session
//! 3. Redirects visitors without an auth cookie away from protected paths
//! 4. Runs the handler with the [`CurrentSession`](crate::models::CurrentSession)
//!    in the request extensions and applies pending cookie changes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::session::resolve_session;
use crate::services::{Access, CookieKind, check_access};
use crate::state::AppState;

/// Session resolution and access control middleware.
pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let cookies = state.cookies();
    let mut resolved = resolve_session(&state, &jar).await;

    if !state.config().guard_bypass_paths.matches(&path) {
        // The guard only looks at cookie presence; handlers that need a user
        // re-check the resolved session through `RequireAuth`.
        let has_auth_cookie = cookies.is_present(&jar, CookieKind::Auth);

        if !has_auth_cookie && resolved.current.guest.is_none() {
            match state.guests().create().await {
                Ok(guest) => resolved.attach_guest(guest),
                Err(e) => {
                    tracing::warn!(error = %e, "Guest session unavailable, continuing without one");
                }
            }
        }

        if let Access::RedirectTo(location) =
            check_access(&path, has_auth_cookie, &state.config().protected_paths)
        {
            tracing::debug!(path = %path, "Redirecting anonymous visitor to sign-in");
            let response = Redirect::to(&location).into_response();
            return resolved.finish(cookies, jar, response);
        }
    }

    request.extensions_mut().insert(resolved.current.clone());
    let response = next.run(request).await;
    resolved.finish(cookies, jar, response)
}
