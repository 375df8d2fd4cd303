//! Authentication service.
//!
//! Email/password accounts with server-side sessions. A session lives for
//! seven days; its expiry slides forward at most once a day while the user
//! keeps visiting, and an expired session is deleted the next time it is
//! presented.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::instrument;

use footwear_core::SessionToken;

use crate::db::{RepositoryError, UserSessionStore, UserStore};
use crate::models::{User, UserSession};
use crate::services::validation::{SignInInput, SignUpInput};

/// A user together with the session just created for them.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session: UserSession,
}

/// A live session resolved from a cookie.
#[derive(Debug, Clone)]
pub struct ResolvedAuth {
    pub user: User,
    pub session: UserSession,
    /// The expiry was slid forward; the cookie should be re-issued.
    pub refreshed: bool,
}

/// Authentication service.
///
/// Handles registration, login, session resolution and logout. Inputs are
/// validated by the caller before they reach this service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn UserSessionStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn UserSessionStore>) -> Self {
        Self { users, sessions }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user and open a session for them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<Authenticated, AuthError> {
        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create_user(&input.email, &input.name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let session = self.open_session(&user).await?;
        tracing::info!(user_id = %user.id, "User signed up");

        Ok(Authenticated { user, session })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn sign_in(&self, input: &SignInInput) -> Result<Authenticated, AuthError> {
        let (user, password_hash) = self
            .users
            .find_user_with_password(&input.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&input.password, &password_hash)?;

        let session = self.open_session(&user).await?;
        tracing::info!(user_id = %user.id, "User signed in");

        Ok(Authenticated { user, session })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown or expired tokens, deleting expired rows
    /// on the way. A live session older than a day is slid forward.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    #[instrument(skip_all)]
    pub async fn resolve(&self, token: SessionToken) -> Result<Option<ResolvedAuth>, AuthError> {
        let Some(session) = self.sessions.find_user_session(token).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_expired_at(now) {
            self.sessions.delete_user_session(token).await?;
            tracing::debug!(user_id = %session.user_id, "Expired user session removed");
            return Ok(None);
        }

        let Some(user) = self.users.find_user(session.user_id).await? else {
            // Orphaned session: the user row is gone.
            self.sessions.delete_user_session(token).await?;
            return Ok(None);
        };

        if session.needs_refresh_at(now) {
            let session = session.refreshed_at(now);
            let refreshed = self.sessions.extend_user_session(&session).await?;
            return Ok(Some(ResolvedAuth {
                user,
                session,
                refreshed,
            }));
        }

        Ok(Some(ResolvedAuth {
            user,
            session,
            refreshed: false,
        }))
    }

    /// Delete a session. Signing out twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn sign_out(&self, token: SessionToken) -> Result<(), AuthError> {
        if self.sessions.delete_user_session(token).await? {
            tracing::info!("User signed out");
        }
        Ok(())
    }

    async fn open_session(&self, user: &User) -> Result<UserSession, AuthError> {
        let session = UserSession::new(user.id, Utc::now());
        self.sessions.insert_user_session(&session).await?;
        Ok(session)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::validation::{PasswordPolicy, validate_sign_in, validate_sign_up};

    fn service(store: &Arc<MemoryStore>) -> AuthService {
        AuthService::new(store.clone(), store.clone())
    }

    fn sign_up_input(email: &str) -> SignUpInput {
        validate_sign_up(email, "Ada Lovelace", "Engine1843", &PasswordPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);

        let created = auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();
        assert_eq!(created.user.email.as_str(), "ada@example.com");

        let input = validate_sign_in("ADA@example.com", "Engine1843").unwrap();
        let signed_in = auth.sign_in(&input).await.unwrap();
        assert_eq!(signed_in.user.id, created.user.id);
        assert_ne!(signed_in.session.token, created.session.token);
        assert_eq!(store.user_session_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);

        auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();
        let err = auth
            .sign_up(&sign_up_input("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();

        let wrong = validate_sign_in("ada@example.com", "Engine1844").unwrap();
        let unknown = validate_sign_in("bob@example.com", "Engine1843").unwrap();
        let a = auth.sign_in(&wrong).await.unwrap_err();
        let b = auth.sign_in(&unknown).await.unwrap_err();
        assert!(matches!(a, AuthError::InvalidCredentials));
        assert_eq!(a.public_message(), b.public_message());
        assert_eq!(a.public_message(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_resolve_slides_stale_sessions() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        let created = auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();

        let fresh = auth.resolve(created.session.token).await.unwrap().unwrap();
        assert!(!fresh.refreshed);

        let mut stale = created.session.clone();
        stale.updated_at = Utc::now() - Duration::days(2);
        stale.expires_at = Utc::now() + Duration::days(5);
        store.put_user_session(stale).await;

        let resolved = auth.resolve(created.session.token).await.unwrap().unwrap();
        assert!(resolved.refreshed);
        assert!(resolved.session.expires_at > Utc::now() + Duration::days(6));
    }

    #[tokio::test]
    async fn test_resolve_deletes_expired_sessions() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        let created = auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();

        let mut expired = created.session.clone();
        expired.expires_at = Utc::now() - Duration::minutes(1);
        store.put_user_session(expired).await;

        assert!(auth.resolve(created.session.token).await.unwrap().is_none());
        assert_eq!(store.user_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        let created = auth.sign_up(&sign_up_input("ada@example.com")).await.unwrap();

        auth.sign_out(created.session.token).await.unwrap();
        auth.sign_out(created.session.token).await.unwrap();
        assert!(auth.resolve(created.session.token).await.unwrap().is_none());
    }
}
