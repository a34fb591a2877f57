//! Per-IP rate limiting for `/checkout` using governor and `tower_governor`.
//!
//! Each checkout attempt can create an order and a payment at the commerce
//! platform, so the limit is tight.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::error_response;

/// Proxy headers carrying the client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that prefers proxy headers and falls back to the peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        if let Some(ip) = CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        }) {
            return Ok(ip);
        }

        // X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer = GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, Body>;

/// Create the checkout rate limiter: ~20 attempts per minute per IP.
///
/// Configuration: 1 request every 3 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(3)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(3)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(3) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rejection_response)
}

/// Render limiter rejections in the same JSON shape as every other failure.
fn rejection_response(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                format!("Too many checkout attempts, retry in {wait_time} seconds"),
            );
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        _ => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to identify client",
        ),
    }
}
