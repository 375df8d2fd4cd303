//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables (schema `storefront`)
//!
//! - `user`, `user_password` - Registered users and their argon2 hashes
//! - `user_session` - Authenticated sessions (`auth_session` cookie)
//! - `guest_session` - Anonymous sessions (`guest_session` cookie)
//! - `guest_cart_item`, `cart_item` - Cart lines owned by a guest or a user
//! - `product` - Read-only catalog, written by `fw-cli seed`
//!
//! # Storage seams
//!
//! Services depend on the traits below rather than on `PgPool` so the whole
//! request pipeline can run against [`MemoryStore`] in tests. The `Pg*`
//! repositories are the production implementations.
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are run via:
//! ```bash
//! cargo run -p footwear-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod products;
pub mod sessions;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use footwear_core::{Email, ProductId, SessionToken, UserId};

use crate::models::{CartItem, CartOwner, GuestSession, Product, User, UserSession};

pub use carts::CartRepository;
pub use memory::MemoryStore;
pub use products::{NewProduct, ProductRepository};
pub use sessions::{GuestSessionRepository, UserSessionRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx (connection, timeout, query failure).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Persistence for anonymous guest sessions.
#[async_trait]
pub trait GuestSessionStore: Send + Sync {
    async fn insert_guest_session(&self, session: &GuestSession) -> Result<(), RepositoryError>;

    /// Fetch a session by token, expired or not.
    async fn find_guest_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<GuestSession>, RepositoryError>;

    /// Returns `true` if a row was deleted. Guest cart lines go with it.
    async fn delete_guest_session(&self, token: SessionToken) -> Result<bool, RepositoryError>;
}

/// Persistence for authenticated user sessions.
#[async_trait]
pub trait UserSessionStore: Send + Sync {
    async fn insert_user_session(&self, session: &UserSession) -> Result<(), RepositoryError>;

    /// Fetch a session by token, expired or not.
    async fn find_user_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<UserSession>, RepositoryError>;

    /// Persist a slid expiry. Returns `false` if the session is gone.
    async fn extend_user_session(&self, session: &UserSession) -> Result<bool, RepositoryError>;

    async fn delete_user_session(&self, token: SessionToken) -> Result<bool, RepositoryError>;
}

/// Persistence for users and their password hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user together with their password hash.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn create_user(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Fetch a user and their password hash by email.
    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

/// Persistence for guest and user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_items(&self, owner: CartOwner) -> Result<Vec<CartItem>, RepositoryError>;

    /// Add `quantity` of a product, summing with any existing line.
    async fn add_cart_item(
        &self,
        owner: CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError>;

    /// Move every line of a live guest cart into the user's cart, summing
    /// quantities on duplicate products, and empty the guest cart.
    ///
    /// Returns the number of lines moved; `0` when the guest session is
    /// gone, expired, or already merged by a concurrent request.
    async fn transfer_guest_cart(
        &self,
        guest: SessionToken,
        user_id: UserId,
    ) -> Result<u64, RepositoryError>;
}

/// Read-only access to the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}
