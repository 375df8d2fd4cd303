//! Cart operations for guests and users.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::instrument;

use footwear_core::ProductId;

use super::catalog::CatalogService;
use super::guest::{GuestSessionError, GuestSessionService};
use crate::db::{CartStore, RepositoryError};
use crate::models::{CartItem, CartOwner, CartSummary, CurrentSession};

/// Largest quantity accepted in a single add.
pub const MAX_ADD_QUANTITY: u32 = 99;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("quantity must be between 1 and {MAX_ADD_QUANTITY}")]
    InvalidQuantity,

    #[error(transparent)]
    Guest(#[from] GuestSessionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Reads and updates carts.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: CatalogService,
    guests: GuestSessionService,
}

impl CartService {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: CatalogService,
        guests: GuestSessionService,
    ) -> Self {
        Self {
            carts,
            catalog,
            guests,
        }
    }

    /// Raw cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn items(&self, owner: CartOwner) -> Result<Vec<CartItem>, RepositoryError> {
        self.carts.cart_items(owner).await
    }

    /// Total number of units in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn count(&self, owner: CartOwner) -> Result<u32, RepositoryError> {
        Ok(self
            .items(owner)
            .await?
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity)))
    }

    /// The cart priced against the catalog. Visitors without a cart get an
    /// empty one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn summary(&self, owner: Option<CartOwner>) -> Result<CartSummary, RepositoryError> {
        let items = match owner {
            Some(owner) => self.items(owner).await?,
            None => Vec::new(),
        };
        let products = self.catalog.list_products().await?;
        Ok(CartSummary::build(&items, &products))
    }

    /// Add `quantity` of a product to the current visitor's cart.
    ///
    /// A visitor with neither an authenticated nor a live guest session gets
    /// a new guest session first; its cookie is added to `jar`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` or `CartError::InvalidQuantity` for
    /// bad input, and store errors otherwise.
    #[instrument(skip(self, session, jar), fields(product_id = %product_id))]
    pub async fn add(
        &self,
        session: &CurrentSession,
        jar: CookieJar,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(CookieJar, CartItem), CartError> {
        if quantity == 0 || quantity > MAX_ADD_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(CartError::UnknownProduct(product_id));
        }

        let (jar, owner) = match session.cart_owner() {
            Some(owner) => (jar, owner),
            None => {
                let (jar, guest) = self.guests.start(jar).await?;
                (jar, CartOwner::Guest(guest.token))
            }
        };

        let item = self.carts.add_cart_item(owner, product_id, quantity).await?;
        tracing::debug!(quantity = item.quantity, "Cart line updated");

        Ok((jar, item))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::product::fixtures::product;
    use crate::services::cookies::{GUEST_COOKIE, SessionCookies};

    fn service(store: &Arc<MemoryStore>) -> CartService {
        let catalog = CatalogService::new(store.clone(), Duration::from_secs(60));
        let guests = GuestSessionService::new(store.clone(), SessionCookies::new(false));
        CartService::new(store.clone(), catalog, guests)
    }

    #[tokio::test]
    async fn test_anonymous_add_creates_guest_session() {
        let store = Arc::new(MemoryStore::with_products(vec![product(1, "Dunk Low", 11000)]));
        let carts = service(&store);

        let (jar, item) = carts
            .add(&CurrentSession::default(), CookieJar::new(), ProductId::new(1), 2)
            .await
            .unwrap();

        assert_eq!(item.quantity, 2);
        assert!(jar.get(GUEST_COOKIE).is_some());
        assert_eq!(store.guest_session_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_sums_and_counts() {
        let store = Arc::new(MemoryStore::with_products(vec![
            product(1, "Dunk Low", 11000),
            product(2, "Blazer Mid", 10500),
        ]));
        let carts = service(&store);
        let guest = carts.guests.create().await.unwrap();
        let session = CurrentSession {
            user: None,
            guest: Some(guest.clone()),
        };

        for (id, quantity) in [(1, 1), (1, 2), (2, 1)] {
            let (jar, item) = carts
                .add(&session, CookieJar::new(), ProductId::new(id), quantity)
                .await
                .unwrap();
            assert_eq!(item.product_id, ProductId::new(id));
            assert!(jar.get(GUEST_COOKIE).is_none());
        }

        let owner = CartOwner::Guest(guest.token);
        assert_eq!(carts.items(owner).await.unwrap().len(), 2);
        assert_eq!(carts.count(owner).await.unwrap(), 4);

        let summary = carts.summary(Some(owner)).await.unwrap();
        assert_eq!(summary.subtotal.to_string(), "$435.00");
    }

    #[tokio::test]
    async fn test_rejects_unknown_product_and_bad_quantity() {
        let store = Arc::new(MemoryStore::with_products(vec![product(1, "Dunk Low", 11000)]));
        let carts = service(&store);
        let session = CurrentSession::default();

        let err = carts
            .add(&session, CookieJar::new(), ProductId::new(42), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UnknownProduct(_)));

        let err = carts
            .add(&session, CookieJar::new(), ProductId::new(1), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
        assert_eq!(store.guest_session_count().await, 0);
    }
}
