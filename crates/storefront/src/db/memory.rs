//! In-process implementation of every storage trait.
//!
//! Used by the router tests and for running the storefront without a
//! database. Mirrors the `PostgreSQL` semantics that the services rely on:
//! unique emails, summing cart upserts, guest cart lines removed with their
//! session and a merge that moves each guest line exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use footwear_core::{Email, ProductId, SessionToken, UserId};

use super::{
    CartStore, GuestSessionStore, ProductStore, RepositoryError, UserSessionStore, UserStore,
};
use crate::models::{CartItem, CartOwner, GuestSession, Product, User, UserSession};

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    user_sessions: HashMap<SessionToken, UserSession>,
    guest_sessions: HashMap<SessionToken, GuestSession>,
    /// Lines per owner, in insertion order.
    carts: HashMap<CartOwner, Vec<CartItem>>,
    products: Vec<Product>,
}

/// Shared in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    guest_sessions_down: AtomicBool,
    carts_down: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with a catalog.
    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            state: Mutex::new(State {
                products,
                ..State::default()
            }),
            ..Self::default()
        }
    }

    /// Make guest session operations fail as if the database were down.
    pub fn set_guest_sessions_unavailable(&self, down: bool) {
        self.guest_sessions_down.store(down, Ordering::SeqCst);
    }

    /// Make cart operations fail as if the database were down.
    pub fn set_carts_unavailable(&self, down: bool) {
        self.carts_down.store(down, Ordering::SeqCst);
    }

    /// Number of stored guest sessions, expired or not.
    pub async fn guest_session_count(&self) -> usize {
        self.state.lock().await.guest_sessions.len()
    }

    /// Number of stored user sessions, expired or not.
    pub async fn user_session_count(&self) -> usize {
        self.state.lock().await.user_sessions.len()
    }

    /// Overwrite a stored guest session, e.g. to backdate its expiry.
    pub async fn put_guest_session(&self, session: GuestSession) {
        self.state
            .lock()
            .await
            .guest_sessions
            .insert(session.token, session);
    }

    /// Overwrite a stored user session, e.g. to backdate its expiry.
    pub async fn put_user_session(&self, session: UserSession) {
        self.state
            .lock()
            .await
            .user_sessions
            .insert(session.token, session);
    }

    fn check(flag: &AtomicBool) -> Result<(), RepositoryError> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn add_line(lines: &mut Vec<CartItem>, product_id: ProductId, quantity: u32) -> CartItem {
    if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
        line.quantity = line.quantity.saturating_add(quantity);
        return *line;
    }
    let line = CartItem {
        product_id,
        quantity,
    };
    lines.push(line);
    line
}

#[async_trait]
impl GuestSessionStore for MemoryStore {
    async fn insert_guest_session(&self, session: &GuestSession) -> Result<(), RepositoryError> {
        Self::check(&self.guest_sessions_down)?;
        let mut state = self.state.lock().await;
        if state.guest_sessions.contains_key(&session.token) {
            return Err(RepositoryError::Conflict(
                "guest session token collision".to_string(),
            ));
        }
        state.guest_sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn find_guest_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<GuestSession>, RepositoryError> {
        Self::check(&self.guest_sessions_down)?;
        Ok(self.state.lock().await.guest_sessions.get(&token).cloned())
    }

    async fn delete_guest_session(&self, token: SessionToken) -> Result<bool, RepositoryError> {
        Self::check(&self.guest_sessions_down)?;
        let mut state = self.state.lock().await;
        state.carts.remove(&CartOwner::Guest(token));
        Ok(state.guest_sessions.remove(&token).is_some())
    }
}

#[async_trait]
impl UserSessionStore for MemoryStore {
    async fn insert_user_session(&self, session: &UserSession) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.user_sessions.contains_key(&session.token) {
            return Err(RepositoryError::Conflict(
                "user session token collision".to_string(),
            ));
        }
        state.user_sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn find_user_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<UserSession>, RepositoryError> {
        Ok(self.state.lock().await.user_sessions.get(&token).cloned())
    }

    async fn extend_user_session(&self, session: &UserSession) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        match state.user_sessions.get_mut(&session.token) {
            Some(stored) => {
                stored.expires_at = session.expires_at;
                stored.updated_at = session.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user_session(&self, token: SessionToken) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.user_sessions.remove(&token).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|(u, _)| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }
        let id = i32::try_from(state.users.len() + 1)
            .map_err(|_| RepositoryError::Conflict("user id space exhausted".to_string()))?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(id),
            email: email.clone(),
            name: name.to_string(),
            email_verified: false,
            created_at: now,
            updated_at: now,
        };
        state.users.push((user.clone(), password_hash.to_string()));
        Ok(user)
    }

    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(u, _)| &u.email == email).cloned())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_items(&self, owner: CartOwner) -> Result<Vec<CartItem>, RepositoryError> {
        Self::check(&self.carts_down)?;
        let state = self.state.lock().await;
        Ok(state.carts.get(&owner).cloned().unwrap_or_default())
    }

    async fn add_cart_item(
        &self,
        owner: CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, RepositoryError> {
        Self::check(&self.carts_down)?;
        let mut state = self.state.lock().await;
        if let CartOwner::Guest(token) = owner
            && !state.guest_sessions.contains_key(&token)
        {
            return Err(RepositoryError::NotFound);
        }
        let lines = state.carts.entry(owner).or_default();
        Ok(add_line(lines, product_id, quantity))
    }

    async fn transfer_guest_cart(
        &self,
        guest: SessionToken,
        user_id: UserId,
    ) -> Result<u64, RepositoryError> {
        Self::check(&self.carts_down)?;
        let mut state = self.state.lock().await;

        let live = state
            .guest_sessions
            .get(&guest)
            .is_some_and(|s| !s.is_expired_at(Utc::now()));
        if !live {
            return Ok(0);
        }

        let Some(guest_lines) = state.carts.remove(&CartOwner::Guest(guest)) else {
            return Ok(0);
        };
        let user_lines = state.carts.entry(CartOwner::User(user_id)).or_default();
        for line in &guest_lines {
            add_line(user_lines, line.product_id, line.quantity);
        }
        Ok(u64::try_from(guest_lines.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.state.lock().await.products.clone())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guest_cart_goes_with_its_session() {
        let store = MemoryStore::new();
        let guest = GuestSession::new(Utc::now());
        store.insert_guest_session(&guest).await.unwrap();
        let owner = CartOwner::Guest(guest.token);
        store
            .add_cart_item(owner, ProductId::new(1), 2)
            .await
            .unwrap();

        assert!(store.delete_guest_session(guest.token).await.unwrap());
        assert!(store.cart_items(owner).await.unwrap().is_empty());
        assert!(!store.delete_guest_session(guest.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_transfer_sums_and_runs_once() {
        let store = MemoryStore::new();
        let guest = GuestSession::new(Utc::now());
        store.insert_guest_session(&guest).await.unwrap();
        let user = CartOwner::User(UserId::new(1));
        store
            .add_cart_item(CartOwner::Guest(guest.token), ProductId::new(7), 2)
            .await
            .unwrap();
        store.add_cart_item(user, ProductId::new(7), 1).await.unwrap();

        let moved = store
            .transfer_guest_cart(guest.token, UserId::new(1))
            .await
            .unwrap();
        assert_eq!(moved, 1);
        let again = store
            .transfer_guest_cart(guest.token, UserId::new(1))
            .await
            .unwrap();
        assert_eq!(again, 0);

        let items = store.cart_items(user).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let email = Email::parse("ada@example.com").unwrap();
        store.create_user(&email, "Ada", "hash").await.unwrap();
        let err = store.create_user(&email, "Ada", "hash").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
