//! HTTP route handlers for the checkout service.
//!
//! # Route Structure
//!
//! ```text
//! POST /checkout   - Price, create the order and capture payment (rate limited)
//! GET  /config     - Public payment form identifiers
//! GET  /selftest   - Credential and price table health
//! GET  /health     - Liveness
//! GET  /*          - Static front end with index.html fallback (if STATIC_DIR is set)
//! ```

pub mod checkout;
pub mod config;
pub mod selftest;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{checkout_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            post(checkout::checkout).layer(checkout_rate_limiter()),
        )
        .route("/config", get(config::public_config))
        .route("/selftest", get(selftest::selftest))
        .route("/health", get(health))
}

/// Build the complete application: routes, static files, tracing and
/// request IDs.
pub fn app(state: AppState) -> Router {
    let mut router = routes();

    if let Some(dir) = &state.config().static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
