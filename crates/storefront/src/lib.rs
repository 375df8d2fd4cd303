//! Footwear storefront library.
//!
//! The axum application behind the `footwear-storefront` binary: guest and
//! authenticated sessions, the protected-route guard, catalog and carts.
//! Exposed as a library so the CLI can reuse the repositories and the
//! router can be driven from tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
