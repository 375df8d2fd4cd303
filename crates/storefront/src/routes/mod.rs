//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database)
//!
//! GET  /                       - Home page
//! GET  /products               - Product listing (?category=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart, redirects to /cart
//!
//! # Auth pages
//! GET  /sign-in                - Sign-in page (?redirect=)
//! GET  /sign-up                - Sign-up page (?redirect=)
//!
//! # Requires auth
//! GET  /checkout               - Order review
//! GET  /account                - Account overview
//!
//! # JSON API
//! POST /api/auth/sign-in       - Sign in (rate limited)
//! POST /api/auth/sign-up       - Sign up (rate limited)
//! POST /api/auth/sign-out      - Sign out
//! GET  /api/session            - Current session state
//! GET  /api/products           - Catalog
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod layout;
pub mod products;


use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, make_request_span, request_id_middleware, route_guard,
};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
}

/// Create the auth API router, rate limited when enabled.
pub fn auth_api_routes(config: &StorefrontConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/sign-in", post(api::auth::sign_in))
        .route("/sign-up", post(api::auth::sign_up))
        .route("/sign-out", post(api::auth::sign_out));

    match config.rate_limit.then(auth_rate_limiter).flatten() {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

/// Create the JSON API router.
pub fn api_routes(config: &StorefrontConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/session", get(api::session::show))
        .route("/products", get(api::products::index));

    let router = match config.rate_limit.then(api_rate_limiter).flatten() {
        Some(limiter) => router.layer(limiter),
        None => router,
    };

    router.nest("/auth", auth_api_routes(config))
}

/// Every route behind the session guard.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show))
        .route("/account", get(account::index))
        .route("/sign-in", get(auth::sign_in_page))
        .route("/sign-up", get(auth::sign_up_page))
        .nest("/api", api_routes(config))
        // Unknown paths still pass the guard, so /orders redirects
        // anonymous visitors before it 404s.
        .fallback(not_found)
}

/// Build the full application router.
///
/// Health checks sit outside the guard so probes never create sessions.
pub fn app(state: AppState) -> Router {
    let guarded =
        routes(state.config()).layer(from_fn_with_state(state.clone(), route_guard));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .merge(guarded)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    AppError::NotFound("page".to_string())
}
