//! Public payment form configuration.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::config::SquareEnvironment;
use crate::state::AppState;

/// Identifiers the browser needs to load the card form. Never secret.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub application_id: Option<String>,
    pub location_id: Option<String>,
    pub env: SquareEnvironment,
}

/// GET /config
pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let square = &state.config().square;
    Json(PublicConfig {
        application_id: square.application_id.clone(),
        location_id: square.location_id.clone(),
        env: square.environment,
    })
}
