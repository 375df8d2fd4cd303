//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{
    CartRepository, CartStore, GuestSessionRepository, GuestSessionStore, MemoryStore,
    ProductRepository, ProductStore, UserRepository, UserSessionRepository, UserSessionStore,
    UserStore,
};
use crate::services::{
    AuthService, CartService, CatalogService, GuestSessionService, SessionCookies, SessionMerger,
};

/// The storage backends the services run on.
#[derive(Clone)]
pub struct Stores {
    pub guest_sessions: Arc<dyn GuestSessionStore>,
    pub user_sessions: Arc<dyn UserSessionStore>,
    pub users: Arc<dyn UserStore>,
    pub carts: Arc<dyn CartStore>,
    pub products: Arc<dyn ProductStore>,
}

impl Stores {
    /// `PostgreSQL` repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            guest_sessions: Arc::new(GuestSessionRepository::new(pool.clone())),
            user_sessions: Arc::new(UserSessionRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            carts: Arc::new(CartRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
        }
    }

    /// Every store backed by one in-memory instance.
    #[must_use]
    pub fn memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            guest_sessions: store.clone(),
            user_sessions: store.clone(),
            users: store.clone(),
            carts: store.clone(),
            products: store.clone(),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the connection pool, configuration and services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    cookies: SessionCookies,
    guests: GuestSessionService,
    auth: AuthService,
    merger: SessionMerger,
    catalog: CatalogService,
    carts: CartService,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let stores = Stores::postgres(&pool);
        Self::from_stores(config, stores, Some(pool))
    }

    /// Wire the services over explicit stores.
    ///
    /// `pool` is only used by the readiness probe; without one the service
    /// always reports ready.
    #[must_use]
    pub fn from_stores(config: StorefrontConfig, stores: Stores, pool: Option<PgPool>) -> Self {
        let cookies = SessionCookies::new(config.secure_cookies());
        let guests = GuestSessionService::new(stores.guest_sessions, cookies);
        let auth = AuthService::new(stores.users, stores.user_sessions);
        let merger = SessionMerger::new(stores.carts.clone(), guests.clone());
        let catalog = CatalogService::new(stores.products, config.catalog_cache_ttl);
        let carts = CartService::new(stores.carts, catalog.clone(), guests.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cookies,
                guests,
                auth,
                merger,
                catalog,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// The session cookie codec.
    #[must_use]
    pub fn cookies(&self) -> SessionCookies {
        self.inner.cookies
    }

    #[must_use]
    pub fn guests(&self) -> &GuestSessionService {
        &self.inner.guests
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn merger(&self) -> &SessionMerger {
        &self.inner.merger
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }
}
