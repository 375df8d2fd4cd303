//! JSON API handlers.

pub mod auth;
pub mod products;
pub mod session;
