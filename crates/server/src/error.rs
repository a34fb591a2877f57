//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{ "success": false, "error": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orderline_core::CheckoutError;
use serde::Serialize;
use thiserror::Error;

/// Application-level error type for the checkout service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout pipeline failure.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned to the browser.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(
                CheckoutError::MalformedRequest(_)
                | CheckoutError::UnknownItem(_)
                | CheckoutError::InvalidQuantity(_)
                | CheckoutError::MissingDeliveryAddress
                | CheckoutError::OrderCreationFailed(_)
                | CheckoutError::PaymentCaptureFailed(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Checkout(
                CheckoutError::ProviderUnavailable(_) | CheckoutError::Configuration(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Checkout(CheckoutError::Configuration(_)) => {
                "Checkout is temporarily unavailable".to_string()
            }
            Self::Checkout(err) => err.to_string(),
        };

        error_response(status, message)
    }
}

/// Render `{ "success": false, "error": message }` with `status`.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_request() {
        let (status, body) =
            body_json(CheckoutError::UnknownItem("Unicorn Combo".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Unknown item: Unicorn Combo"})
        );
    }

    #[tokio::test]
    async fn test_remote_failures() {
        let (status, _) =
            body_json(CheckoutError::PaymentCaptureFailed("Card declined".to_string()).into())
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            body_json(CheckoutError::ProviderUnavailable("timeout".to_string()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Payment service unavailable: timeout");
    }

    #[tokio::test]
    async fn test_configuration_detail_is_hidden() {
        let (status, body) = body_json(
            CheckoutError::Configuration("SQUARE_ACCESS_TOKEN is not set".to_string()).into(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body["error"].as_str().unwrap().contains("SQUARE"));
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let (status, body) = body_json(AppError::Internal("task panicked".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
