//! End-to-end session and checkout flows.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (`fw-cli migrate`, `fw-cli seed products`)
//! - The storefront running (cargo run -p footwear-storefront)
//!
//! Run with: cargo test -p footwear-integration-tests -- --ignored

use footwear_integration_tests::{storefront_base_url, unique_email};
use reqwest::{Client, Response, StatusCode, header};
use serde_json::Value;

/// A browser-like client: keeps cookies, never follows redirects.
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn set_cookie_names(resp: &Response) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split('=').next())
        .map(String::from)
        .collect()
}

fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn first_product_id(client: &Client) -> i64 {
    let base_url = storefront_base_url();
    let products: Value = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");
    products
        .get(0)
        .and_then(|p| p.get("id"))
        .and_then(Value::as_i64)
        .expect("Catalog is empty; run fw-cli seed products")
}

async fn sign_up(client: &Client, email: &str) -> Response {
    let base_url = storefront_base_url();
    client
        .post(format!("{base_url}/api/auth/sign-up"))
        .form(&[
            ("email", email),
            ("name", "Grace Hopper"),
            ("password", "Sneakers42"),
            ("redirect", "/checkout"),
        ])
        .send()
        .await
        .expect("Failed to sign up")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health_endpoints() {
    let client = browser();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookie_names(&resp).is_empty());

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Guest sessions and the route guard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_first_visit_issues_guest_cookie_once() {
    let client = browser();
    let base_url = storefront_base_url();

    let resp = client.get(&base_url).send().await.expect("Failed to load home");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookie_names(&resp).contains(&"guest_session".to_string()));

    let resp = client.get(&base_url).send().await.expect("Failed to load home");
    assert!(!set_cookie_names(&resp).contains(&"guest_session".to_string()));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_guest_is_sent_to_sign_in_from_checkout() {
    let client = browser();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to request checkout");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/sign-in?redirect=%2Fcheckout");
}

// ============================================================================
// Sign-up, cart merge, sign-out
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded catalog"]
async fn test_guest_cart_follows_visitor_through_sign_up() {
    let client = browser();
    let base_url = storefront_base_url();
    let product_id = first_product_id(&client).await.to_string();

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .form(&[("product_id", product_id.as_str()), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");

    let resp = sign_up(&client, &unique_email()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookie_names(&resp);
    assert!(cookies.contains(&"auth_session".to_string()));
    assert!(cookies.contains(&"guest_session".to_string()));
    let body: Value = resp.json().await.expect("Failed to parse sign-up");
    assert_eq!(body["success"], true);
    assert_eq!(body["redirectTo"], "/checkout");

    let session: Value = client
        .get(format!("{base_url}/api/session"))
        .send()
        .await
        .expect("Failed to get session")
        .json()
        .await
        .expect("Failed to parse session");
    assert_eq!(session["authenticated"], true);
    assert_eq!(session["cartCount"], 2);

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to load checkout");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/api/auth/sign-out"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to request checkout");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_duplicate_sign_up_conflicts() {
    let email = unique_email();

    let resp = sign_up(&browser(), &email).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = sign_up(&browser(), &email).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_invalid_email_is_rejected_per_field() {
    let client = browser();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/auth/sign-in"))
        .form(&[("email", "not-an-email"), ("password", "whatever1")])
        .send()
        .await
        .expect("Failed to sign in");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse response");
    assert!(body["fieldErrors"]["email"].is_array());
}
