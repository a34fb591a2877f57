//! Integration tests for Orderline.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process HTTP tests (no network, scripted commerce backend)
//! cargo test -p orderline-integration-tests
//!
//! # Live tests against a running server with Square sandbox credentials
//! CHECKOUT_BASE_URL=http://localhost:3000 cargo test -p orderline-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - `/checkout` pipeline through the full router
//! - `endpoints` - `/config`, `/selftest`, `/health` and static files
//! - `live` - Smoke tests against a deployed server

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use orderline_core::{PriceAuthority, PriceTable};
use orderline_server::checkout::testing::ScriptedCommerce;
use orderline_server::config::ServerConfig;
use orderline_server::{AppState, app};
use serde_json::Value;
use tower::ServiceExt;

/// A token that passes the placeholder and entropy checks.
pub const TEST_ACCESS_TOKEN: &str = "EAAAl9Qx7Zr2mKp4Vt8Wc1Ny6Hb3Jd5Fg0Ls";

/// Environment for a fully configured sandbox server with 8% tax and a
/// 300 cent delivery fee.
#[must_use]
pub fn configured_env() -> HashMap<String, String> {
    [
        ("SQUARE_ACCESS_TOKEN", TEST_ACCESS_TOKEN),
        ("SQUARE_APPLICATION_ID", "sandbox-sq0idb-test-app"),
        ("SQUARE_LOCATION_ID", "LTEST123"),
        ("TAX_RATE_PERCENT", "8"),
        ("DELIVERY_FEE_CENTS", "300"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Build a server configuration from `vars` alone, ignoring the process
/// environment.
///
/// # Panics
///
/// Panics if the variables do not form a valid configuration.
#[must_use]
pub fn config_from(vars: &HashMap<String, String>) -> ServerConfig {
    ServerConfig::from_lookup(|key| vars.get(key).cloned()).expect("test configuration is valid")
}

/// An in-process server with a scripted commerce backend.
pub struct TestContext {
    pub app: Router,
    pub commerce: Arc<ScriptedCommerce>,
    pub prices: Arc<PriceAuthority>,
}

impl TestContext {
    /// Fully configured server, built-in menu, every remote call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::with(&configured_env(), ScriptedCommerce::succeeding())
    }

    /// Server from `vars` with the given backend.
    #[must_use]
    pub fn with(vars: &HashMap<String, String>, commerce: ScriptedCommerce) -> Self {
        let commerce = Arc::new(commerce);
        let prices = Arc::new(PriceAuthority::new(PriceTable::default_menu()));
        let state = AppState::with_commerce(config_from(vars), prices.clone(), commerce.clone());

        Self {
            app: app(state),
            commerce,
            prices,
        }
    }

    /// POST a raw body to `/checkout`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the response is not JSON.
    pub async fn post_checkout(&self, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::post("/checkout")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.50")
            .body(body.into())
            .expect("valid request");
        self.send_json(request).await
    }

    /// POST a JSON value to `/checkout`.
    pub async fn checkout(&self, body: &Value) -> (StatusCode, Value) {
        self.post_checkout(body.to_string()).await
    }

    /// GET `path` and parse the response as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the response is not JSON.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::get(path).body(Body::empty()).expect("valid request");
        self.send_json(request).await
    }

    /// GET `path` and return the body as text.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::get(path).body(Body::empty()).expect("valid request");
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(request).await;
        let body = serde_json::from_slice(&bytes).expect("response body is JSON");
        (status, body)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        (status, bytes.to_vec())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
