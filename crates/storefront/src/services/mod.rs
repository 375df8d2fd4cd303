//! Business logic services for storefront.
//!
//! # Services
//!
//! - `access` - Protected-path decisions shared by the guard and extractors
//! - `auth` - Email/password accounts and server-side sessions
//! - `cart` - Guest and user carts
//! - `catalog` - Cached product catalog
//! - `cookies` - Session cookie codec
//! - `guest` - Anonymous guest sessions
//! - `merge` - Guest cart to user cart merge on authentication
//! - `validation` - Form input validation

pub mod access;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod cookies;
pub mod guest;
pub mod merge;
pub mod validation;

pub use access::{Access, PathPrefixes, check_access};
pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use catalog::CatalogService;
pub use cookies::{CookieKind, SessionCookies};
pub use guest::{GuestSessionError, GuestSessionService};
pub use merge::{MergeOutcome, SessionMerger};
