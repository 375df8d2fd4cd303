//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Route guard (session resolution, guest issuance, protected paths)
//! 5. Rate limiting on `/api` (governor, optional)

pub mod auth;
pub mod guard;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, OptionalAuth, RequireAuth};
pub use guard::route_guard;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{make_request_span, request_id_middleware};
pub use session::{ResolvedSession, resolve_session};
