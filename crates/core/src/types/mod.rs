//! Core types for the storefront.
//!
//! Type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use token::{SessionToken, TokenError};
