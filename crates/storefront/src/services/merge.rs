//! Guest-to-user cart merging.
//!
//! Runs right after a successful sign-in or sign-up. Merging is best-effort:
//! whatever happens here, authentication has already succeeded and the
//! caller's response does not change.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use footwear_core::UserId;

use super::cookies::CookieKind;
use super::guest::GuestSessionService;
use crate::db::CartStore;

/// What a merge attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No guest cookie, an expired or already-merged guest session, or an
    /// empty guest cart.
    NothingToMerge,
    /// Guest lines were moved into the user's cart.
    Merged { lines: u64 },
    /// The transfer failed and was abandoned. Already logged.
    Failed,
}

/// Moves a guest's cart into a user's cart on authentication.
#[derive(Clone)]
pub struct SessionMerger {
    carts: Arc<dyn CartStore>,
    guests: GuestSessionService,
}

impl SessionMerger {
    #[must_use]
    pub fn new(carts: Arc<dyn CartStore>, guests: GuestSessionService) -> Self {
        Self { carts, guests }
    }

    /// Merge the guest cart named by the request's guest cookie into
    /// `user_id`'s cart.
    ///
    /// Quantities for products in both carts are summed. The guest cookie is
    /// always cleared; the guest session row is deleted only after a
    /// successful transfer. Never touches the authenticated session and
    /// never fails.
    #[instrument(skip(self, jar), fields(user_id = %user_id))]
    pub async fn merge(&self, user_id: UserId, jar: CookieJar) -> (CookieJar, MergeOutcome) {
        let cookies = self.guests.cookies();
        let Some(token) = cookies.read(&jar, CookieKind::Guest) else {
            // A malformed cookie is still cleared.
            let jar = if cookies.is_present(&jar, CookieKind::Guest) {
                cookies.clear(jar, CookieKind::Guest)
            } else {
                jar
            };
            return (jar, MergeOutcome::NothingToMerge);
        };

        let outcome = match self.carts.transfer_guest_cart(token, user_id).await {
            Ok(0) => MergeOutcome::NothingToMerge,
            Ok(lines) => MergeOutcome::Merged { lines },
            Err(e) => {
                tracing::error!(error = %e, "Guest cart merge failed");
                MergeOutcome::Failed
            }
        };

        if outcome != MergeOutcome::Failed
            && let Err(e) = self.guests.delete(token).await
        {
            // The session expires on its own; the cart is already moved.
            tracing::warn!(error = %e, "Failed to delete merged guest session");
        }

        if let MergeOutcome::Merged { lines } = outcome {
            tracing::info!(lines, "Guest cart merged");
        }

        (cookies.clear(jar, CookieKind::Guest), outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderMap;
    use axum::http::header::COOKIE;
    use chrono::{Duration, Utc};

    use footwear_core::ProductId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CartOwner, GuestSession};
    use crate::services::cookies::{GUEST_COOKIE, SessionCookies};

    fn merger(store: &Arc<MemoryStore>) -> SessionMerger {
        let guests = GuestSessionService::new(store.clone(), SessionCookies::new(false));
        SessionMerger::new(store.clone(), guests)
    }

    fn jar_with_guest(guest: &GuestSession) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("{GUEST_COOKIE}={}", guest.token).parse().unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    async fn guest_with_cart(store: &MemoryStore, product: i32, quantity: u32) -> GuestSession {
        let guest = GuestSession::new(Utc::now());
        store.put_guest_session(guest.clone()).await;
        store
            .add_cart_item(CartOwner::Guest(guest.token), ProductId::new(product), quantity)
            .await
            .unwrap();
        guest
    }

    #[tokio::test]
    async fn test_merge_sums_quantities_and_clears_cookie() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new(1);
        let guest = guest_with_cart(&store, 5, 2).await;
        store
            .add_cart_item(CartOwner::User(user), ProductId::new(5), 1)
            .await
            .unwrap();

        let (jar, outcome) = merger(&store).merge(user, jar_with_guest(&guest)).await;

        assert_eq!(outcome, MergeOutcome::Merged { lines: 1 });
        assert!(jar.get(GUEST_COOKIE).is_none());
        let items = store.cart_items(CartOwner::User(user)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(store.guest_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_merge_finds_nothing() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new(1);
        let guest = guest_with_cart(&store, 5, 2).await;
        let merger = merger(&store);

        let (_, first) = merger.merge(user, jar_with_guest(&guest)).await;
        assert_eq!(first, MergeOutcome::Merged { lines: 1 });
        let (_, outcome) = merger.merge(user, jar_with_guest(&guest)).await;

        assert_eq!(outcome, MergeOutcome::NothingToMerge);
        let items = store.cart_items(CartOwner::User(user)).await.unwrap();
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_no_guest_cookie_is_nothing_to_merge() {
        let store = Arc::new(MemoryStore::new());
        let (_, outcome) = merger(&store).merge(UserId::new(1), CookieJar::new()).await;
        assert_eq!(outcome, MergeOutcome::NothingToMerge);
    }

    #[tokio::test]
    async fn test_expired_guest_is_not_merged() {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::new(1);
        let mut guest = guest_with_cart(&store, 5, 2).await;
        guest.expires_at = Utc::now() - Duration::minutes(1);
        store.put_guest_session(guest.clone()).await;

        let (_, outcome) = merger(&store).merge(user, jar_with_guest(&guest)).await;

        assert_eq!(outcome, MergeOutcome::NothingToMerge);
        assert!(store.cart_items(CartOwner::User(user)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transfer_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let guest = guest_with_cart(&store, 5, 2).await;
        store.set_carts_unavailable(true);

        let (jar, outcome) = merger(&store)
            .merge(UserId::new(1), jar_with_guest(&guest))
            .await;

        assert_eq!(outcome, MergeOutcome::Failed);
        assert!(jar.get(GUEST_COOKIE).is_none());
        // The guest session survives so nothing is lost.
        assert_eq!(store.guest_session_count().await, 1);
    }
}
