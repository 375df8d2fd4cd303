//! Per-request session resolution.
//!
//! Resolves the auth and guest cookies exactly once per request and
//! publishes the result as a [`CurrentSession`] request extension. Cookie
//! upkeep (re-issuing a refreshed auth cookie, clearing cookies that point
//! at nothing) is planned here and applied to the response by the guard.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use footwear_core::SessionToken;

use crate::models::session::session_ttl;
use crate::models::{CurrentSession, CurrentUser, GuestSession};
use crate::services::{CookieKind, SessionCookies};
use crate::state::AppState;

/// What to do with one session cookie on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieAction {
    Issue(SessionToken),
    Clear,
}

/// The session state of a request plus pending cookie changes.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSession {
    pub current: CurrentSession,
    guest_cookie: Option<CookieAction>,
    auth_cookie: Option<CookieAction>,
}

impl ResolvedSession {
    /// Adopt a freshly created guest session and schedule its cookie.
    pub fn attach_guest(&mut self, guest: GuestSession) {
        self.guest_cookie = Some(CookieAction::Issue(guest.token));
        self.current.guest = Some(guest);
    }

    #[must_use]
    pub const fn guest_cookie(&self) -> Option<CookieAction> {
        self.guest_cookie
    }

    #[must_use]
    pub const fn auth_cookie(&self) -> Option<CookieAction> {
        self.auth_cookie
    }

    /// Apply the planned cookie changes to `response`.
    ///
    /// A cookie the handler already set on the response wins: sign-in sets
    /// the auth cookie and merge clears the guest cookie, and neither may be
    /// overwritten by upkeep planned before the handler ran.
    pub fn finish(self, cookies: SessionCookies, jar: CookieJar, response: Response) -> Response {
        let mut jar = jar;
        let mut changed = false;

        for (kind, action) in [
            (CookieKind::Guest, self.guest_cookie),
            (CookieKind::Auth, self.auth_cookie),
        ] {
            let Some(action) = action else { continue };
            if sets_cookie(&response, kind.name()) {
                continue;
            }
            jar = match action {
                CookieAction::Issue(token) => cookies.issue(jar, kind, token, session_ttl()),
                CookieAction::Clear => cookies.clear(jar, kind),
            };
            changed = true;
        }

        if changed {
            (jar, response).into_response()
        } else {
            response
        }
    }
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            value
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('='))
        })
}

/// Resolve the session cookies in `jar`.
///
/// Store failures are logged and treated as "no session" without clearing
/// the cookie, so a database blip does not sign anyone out.
pub async fn resolve_session(state: &AppState, jar: &CookieJar) -> ResolvedSession {
    let cookies = state.cookies();
    let mut resolved = ResolvedSession::default();

    match cookies.read(jar, CookieKind::Auth) {
        Some(token) => match state.auth().resolve(token).await {
            Ok(Some(auth)) => {
                if auth.refreshed {
                    resolved.auth_cookie = Some(CookieAction::Issue(token));
                }
                resolved.current.user = Some(CurrentUser::from(&auth.user));
            }
            Ok(None) => resolved.auth_cookie = Some(CookieAction::Clear),
            Err(e) => tracing::error!(error = %e, "Failed to resolve auth session"),
        },
        None if cookies.is_present(jar, CookieKind::Auth) => {
            resolved.auth_cookie = Some(CookieAction::Clear);
        }
        None => {}
    }

    // A signed-in visitor's cart is the user cart; a leftover guest cookie
    // is only looked at again by the merge.
    if resolved.current.is_authenticated() {
        return resolved;
    }

    match cookies.read(jar, CookieKind::Guest) {
        Some(token) => match state.guests().lookup(token).await {
            Ok(Some(guest)) => resolved.current.guest = Some(guest),
            Ok(None) => resolved.guest_cookie = Some(CookieAction::Clear),
            Err(e) => tracing::error!(error = %e, "Failed to resolve guest session"),
        },
        None if cookies.is_present(jar, CookieKind::Guest) => {
            resolved.guest_cookie = Some(CookieAction::Clear);
        }
        None => {}
    }

    resolved
}

/// Handlers read the resolved session straight from the extensions.
///
/// Outside the session layer every request is anonymous.
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_default())
    }
}
