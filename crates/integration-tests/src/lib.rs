//! End-to-end tests for the Footwear storefront.
//!
//! The tests drive a running server over HTTP and are `#[ignore]`d by
//! default.
//!
//! ```bash
//! fw-cli migrate && fw-cli seed products
//! cargo run -p footwear-storefront &
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p footwear-integration-tests -- --ignored
//! ```

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A unique address so repeated runs never collide on sign-up.
#[must_use]
pub fn unique_email() -> String {
    format!("e2e-{}@example.com", uuid::Uuid::new_v4().simple())
}
