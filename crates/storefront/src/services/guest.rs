//! Guest session lifecycle.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use footwear_core::SessionToken;

use super::cookies::{CookieKind, SessionCookies};
use crate::db::{GuestSessionStore, RepositoryError};
use crate::models::GuestSession;
use crate::models::session::session_ttl;

/// Errors from the guest session store.
#[derive(Debug, Error)]
pub enum GuestSessionError {
    /// Persistence failed. Callers fall back to stateless browsing.
    #[error("guest session store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),
}

/// Creates, resolves and deletes anonymous guest sessions.
#[derive(Clone)]
pub struct GuestSessionService {
    store: Arc<dyn GuestSessionStore>,
    cookies: SessionCookies,
}

impl GuestSessionService {
    #[must_use]
    pub fn new(store: Arc<dyn GuestSessionStore>, cookies: SessionCookies) -> Self {
        Self { store, cookies }
    }

    /// Persist a fresh guest session that expires in seven days.
    ///
    /// # Errors
    ///
    /// Returns [`GuestSessionError::StoreUnavailable`] if the row cannot be
    /// written. There is no retry.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<GuestSession, GuestSessionError> {
        let session = GuestSession::new(Utc::now());
        self.store.insert_guest_session(&session).await?;
        tracing::debug!(expires_at = %session.expires_at, "Guest session created");
        Ok(session)
    }

    /// Create a guest session and attach its cookie to `jar`.
    ///
    /// # Errors
    ///
    /// Returns [`GuestSessionError::StoreUnavailable`] if the row cannot be
    /// written; `jar` is then left untouched by the caller.
    pub async fn start(
        &self,
        jar: CookieJar,
    ) -> Result<(CookieJar, GuestSession), GuestSessionError> {
        let session = self.create().await?;
        let jar = self.issue_cookie(jar, &session);
        Ok((jar, session))
    }

    /// Attach the cookie for an existing guest session.
    #[must_use]
    pub fn issue_cookie(&self, jar: CookieJar, session: &GuestSession) -> CookieJar {
        self.cookies
            .issue(jar, CookieKind::Guest, session.token, session_ttl())
    }

    /// Resolve a token to a live session.
    ///
    /// Unknown and expired tokens resolve to `None`; an expired row is
    /// deleted on the way out, so asking again also yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GuestSessionError::StoreUnavailable`] if the store fails.
    #[instrument(skip_all)]
    pub async fn lookup(
        &self,
        token: SessionToken,
    ) -> Result<Option<GuestSession>, GuestSessionError> {
        let Some(session) = self.store.find_guest_session(token).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            self.store.delete_guest_session(token).await?;
            tracing::debug!("Expired guest session removed");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete a guest session and its cart. Deleting twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GuestSessionError::StoreUnavailable`] if the store fails.
    pub async fn delete(&self, token: SessionToken) -> Result<(), GuestSessionError> {
        self.store.delete_guest_session(token).await?;
        Ok(())
    }

    /// The codec used for guest cookies.
    #[must_use]
    pub const fn cookies(&self) -> SessionCookies {
        self.cookies
    }
}
