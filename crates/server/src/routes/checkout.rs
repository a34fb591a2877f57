//! Checkout endpoint.

use axum::{Json, body::Bytes, extract::State};
use orderline_core::CheckoutError;
use serde::Serialize;
use tracing::instrument;

use crate::checkout::CheckoutPayload;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Successful checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: String,
    pub payment_id: String,
}

/// POST /checkout
///
/// The body is parsed by hand so that any shape problem becomes a
/// `MalformedRequest` in the usual error body. The pipeline runs in its own
/// task: once a remote call has been issued it completes even if the client
/// goes away.
#[instrument(skip_all)]
pub async fn checkout(State(state): State<AppState>, body: Bytes) -> Result<Json<CheckoutResponse>> {
    let payload: CheckoutPayload = serde_json::from_slice(&body)
        .map_err(|e| CheckoutError::MalformedRequest(format!("invalid request body: {e}")))?;

    let service = state.checkout().clone();
    let receipt = tokio::spawn(async move { service.process(payload).await })
        .await
        .map_err(|e| AppError::Internal(format!("checkout task failed: {e}")))??;

    Ok(Json(CheckoutResponse {
        success: true,
        order_id: receipt.order_id.into_inner(),
        payment_id: receipt.payment_id.into_inner(),
    }))
}
