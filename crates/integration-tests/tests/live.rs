//! Smoke tests against a running checkout server.
//!
//! These tests require:
//! - The server running (cargo run -p orderline-server)
//! - Square sandbox credentials in its environment
//!
//! Run with: `CHECKOUT_BASE_URL=http://localhost:3000 cargo test -p orderline-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL for the checkout server (configurable via environment).
fn base_url() -> String {
    std::env::var("CHECKOUT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::test]
#[ignore = "Requires running checkout server with Square sandbox credentials"]
async fn test_live_selftest_is_healthy() {
    let resp = Client::new()
        .get(format!("{}/selftest", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse selftest");
    assert_eq!(body["ok"], true, "selftest problems: {}", body["problems"]);
}

#[tokio::test]
#[ignore = "Requires running checkout server with Square sandbox credentials"]
async fn test_live_sandbox_checkout() {
    // `cnon:card-nonce-ok` is Square's sandbox test nonce for a valid card.
    let resp = Client::new()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "cart": [{"name": "Small Fries", "qty": 1}],
            "contact": {"name": "Integration Test", "phone": "555-0100"},
            "paymentToken": "cnon:card-nonce-ok"
        }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert!(body["orderId"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["paymentId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
#[ignore = "Requires running checkout server"]
async fn test_live_unknown_item_rejected() {
    let resp = Client::new()
        .post(format!("{}/checkout", base_url()))
        .json(&json!({
            "cart": [{"name": "Unicorn Combo", "qty": 1}],
            "contact": {"name": "Integration Test", "phone": "555-0100"},
            "paymentToken": "cnon:card-nonce-ok"
        }))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
