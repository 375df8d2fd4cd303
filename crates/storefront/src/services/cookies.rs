//! Session cookie codec.
//!
//! The only place that knows cookie names and attributes. Both the guard
//! middleware and the auth handlers issue cookies through [`SessionCookies`],
//! so guest and auth cookies always carry the same attributes.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;

use footwear_core::SessionToken;

/// Cookie carrying a guest session token.
pub const GUEST_COOKIE: &str = "guest_session";

/// Cookie carrying an authenticated session token.
pub const AUTH_COOKIE: &str = "auth_session";

/// Which session cookie to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieKind {
    Guest,
    Auth,
}

impl CookieKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Guest => GUEST_COOKIE,
            Self::Auth => AUTH_COOKIE,
        }
    }
}

/// Issues, reads and clears the session cookies.
///
/// Cookies are `HttpOnly`, `SameSite=Strict` and scoped to `/`. `Secure` is
/// set only in production so local HTTP development keeps working.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Add a cookie for `token` that lives for `ttl`.
    #[must_use]
    pub fn issue(
        &self,
        jar: CookieJar,
        kind: CookieKind,
        token: SessionToken,
        ttl: Duration,
    ) -> CookieJar {
        let mut cookie = self.base(kind, token.to_string());
        cookie.set_max_age(cookie::time::Duration::seconds(ttl.num_seconds()));
        jar.add(cookie)
    }

    /// The token in the named cookie, if present and well-formed.
    #[must_use]
    pub fn read(&self, jar: &CookieJar, kind: CookieKind) -> Option<SessionToken> {
        jar.get(kind.name())
            .and_then(|c| SessionToken::parse(c.value()).ok())
    }

    /// Whether the named cookie is present at all, well-formed or not.
    #[must_use]
    pub fn is_present(&self, jar: &CookieJar, kind: CookieKind) -> bool {
        jar.get(kind.name()).is_some_and(|c| !c.value().is_empty())
    }

    /// Emit a removal cookie with the same name, path and attributes.
    #[must_use]
    pub fn clear(&self, jar: CookieJar, kind: CookieKind) -> CookieJar {
        jar.remove(self.base(kind, String::new()))
    }

    fn base(&self, kind: CookieKind, value: String) -> Cookie<'static> {
        Cookie::build((kind.name(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::SET_COOKIE;
    use axum::response::IntoResponse;

    use super::*;
    use crate::models::session::session_ttl;

    fn set_cookies(jar: CookieJar) -> Vec<String> {
        jar.into_response()
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_issue_sets_attributes() {
        let token = SessionToken::generate();
        let jar = SessionCookies::new(false).issue(
            CookieJar::new(),
            CookieKind::Guest,
            token,
            session_ttl(),
        );

        let headers = set_cookies(jar);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with(&format!("guest_session={token}")));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_secure_in_production() {
        let jar = SessionCookies::new(true).issue(
            CookieJar::new(),
            CookieKind::Auth,
            SessionToken::generate(),
            session_ttl(),
        );
        let headers = set_cookies(jar);
        assert!(headers[0].starts_with("auth_session="));
        assert!(headers[0].contains("Secure"));
    }

    #[test]
    fn test_read_ignores_malformed_values() {
        let cookies = SessionCookies::new(false);
        let token = SessionToken::generate();
        let jar = CookieJar::new()
            .add(Cookie::new(GUEST_COOKIE, token.to_string()))
            .add(Cookie::new(AUTH_COOKIE, "garbage"));

        assert_eq!(cookies.read(&jar, CookieKind::Guest), Some(token));
        assert_eq!(cookies.read(&jar, CookieKind::Auth), None);
        assert!(cookies.is_present(&jar, CookieKind::Auth));
    }

    #[test]
    fn test_clear_touches_only_named_cookie() {
        let cookies = SessionCookies::new(false);
        // Removal cookies are only emitted for cookies the request carried.
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!(
                "{GUEST_COOKIE}={}; {AUTH_COOKIE}={}",
                SessionToken::generate(),
                SessionToken::generate()
            )
            .parse()
            .unwrap(),
        );
        let jar = CookieJar::from_headers(&headers);

        let jar = cookies.clear(jar, CookieKind::Guest);
        assert!(jar.get(GUEST_COOKIE).is_none());
        assert!(jar.get(AUTH_COOKIE).is_some());

        let set = set_cookies(jar);
        assert_eq!(set.len(), 1);
        let removal = set
            .iter()
            .find(|h| h.starts_with("guest_session="))
            .unwrap();
        assert!(removal.contains("Max-Age=0"));
        assert!(removal.contains("Path=/"));
    }
}
