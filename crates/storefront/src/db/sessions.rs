//! Guest and user session repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use footwear_core::{SessionToken, UserId};

use super::{GuestSessionStore, RepositoryError, UserSessionStore};
use crate::models::{GuestSession, UserSession};

#[derive(sqlx::FromRow)]
struct GuestSessionRow {
    token: SessionToken,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<GuestSessionRow> for GuestSession {
    fn from(row: GuestSessionRow) -> Self {
        Self {
            token: row.token,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserSessionRow {
    token: SessionToken,
    user_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserSessionRow> for UserSession {
    fn from(row: UserSessionRow) -> Self {
        Self {
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Guest sessions
// =============================================================================

/// `PostgreSQL` repository for `storefront.guest_session`.
#[derive(Clone)]
pub struct GuestSessionRepository {
    pool: PgPool,
}

impl GuestSessionRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestSessionStore for GuestSessionRepository {
    async fn insert_guest_session(&self, session: &GuestSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.guest_session (token, created_at, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(session.token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "guest session token collision"))?;

        Ok(())
    }

    async fn find_guest_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<GuestSession>, RepositoryError> {
        let row: Option<GuestSessionRow> = sqlx::query_as(
            r"
            SELECT token, created_at, expires_at
            FROM storefront.guest_session
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GuestSession::from))
    }

    async fn delete_guest_session(&self, token: SessionToken) -> Result<bool, RepositoryError> {
        // guest_cart_item rows cascade.
        let result = sqlx::query("DELETE FROM storefront.guest_session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// User sessions
// =============================================================================

/// `PostgreSQL` repository for `storefront.user_session`.
#[derive(Clone)]
pub struct UserSessionRepository {
    pool: PgPool,
}

impl UserSessionRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSessionStore for UserSessionRepository {
    async fn insert_user_session(&self, session: &UserSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.user_session (token, user_id, created_at, expires_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "user session token collision"))?;

        Ok(())
    }

    async fn find_user_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<UserSession>, RepositoryError> {
        let row: Option<UserSessionRow> = sqlx::query_as(
            r"
            SELECT token, user_id, created_at, expires_at, updated_at
            FROM storefront.user_session
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserSession::from))
    }

    async fn extend_user_session(&self, session: &UserSession) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.user_session
            SET expires_at = $2, updated_at = $3
            WHERE token = $1
            ",
        )
        .bind(session.token)
        .bind(session.expires_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_session(&self, token: SessionToken) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.user_session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
