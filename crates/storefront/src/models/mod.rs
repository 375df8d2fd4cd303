//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartItem, CartLine, CartOwner, CartSummary};
pub use product::Product;
pub use session::{CurrentSession, CurrentUser, GuestSession, UserSession};
pub use user::User;
