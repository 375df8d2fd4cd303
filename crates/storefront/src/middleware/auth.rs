//! Authentication extractors.
//!
//! Both read the [`CurrentSession`] the guard resolved for this request;
//! neither touches cookies or the session store.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::models::{CurrentSession, CurrentUser};
use crate::services::access::{Access, PathPrefixes, check_access};

/// Extractor that requires an authenticated user.
///
/// Anonymous page requests are redirected to sign-in with the current path
/// as the return target; API requests get `401`.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the visitor is not
/// signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the sign-in page (for HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_owned(), |uri| uri.path().to_owned());

        // A handler that asks for a user protects its own path, listed or not.
        let protected = PathPrefixes::new([path.as_str()]);
        let access = check_access(&path, session.is_authenticated(), &protected);
        match (session.user, access) {
            (Some(user), Access::Allow) => Ok(Self(user)),
            (_, Access::RedirectTo(location)) if !path.starts_with("/api/") => {
                Err(AuthRejection::RedirectToLogin(location))
            }
            _ => Err(AuthRejection::Unauthorized),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state)
            .await
            .unwrap_or_default();
        Ok(Self(session.user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, header::LOCATION};
    use footwear_core::{Email, UserId};

    use super::*;

    fn parts(path: &str, session: Option<CurrentSession>) -> Parts {
        let (mut parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn signed_in() -> CurrentSession {
        CurrentSession {
            user: Some(CurrentUser {
                id: UserId::new(3),
                email: Email::parse("grace@example.com").unwrap(),
                name: "Grace".to_string(),
            }),
            guest: None,
        }
    }

    #[tokio::test]
    async fn test_require_auth_accepts_user() {
        let mut parts = parts("/account", Some(signed_in()));
        let RequireAuth(user) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.name, "Grace");
    }

    #[tokio::test]
    async fn test_require_auth_redirects_pages() {
        let mut parts = parts("/checkout/step2", Some(CurrentSession::default()));
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/sign-in?redirect=%2Fcheckout%2Fstep2"
        );
    }

    #[tokio::test]
    async fn test_require_auth_redirects_from_root() {
        let mut parts = parts("/", Some(CurrentSession::default()));
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/sign-in?redirect=%2F");
    }

    #[tokio::test]
    async fn test_require_auth_rejects_api_requests() {
        let mut parts = parts("/api/orders", None);
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AuthRejection::Unauthorized));
    }

    #[tokio::test]
    async fn test_optional_auth() {
        let mut parts = parts("/", None);
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(user.is_none());

        let mut parts = self::parts("/", Some(signed_in()));
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.unwrap().id, UserId::new(3));
    }
}
