//! Operator self-test.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::config::SquareEnvironment;
use crate::state::AppState;

/// Result of the self-test.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfTestReport {
    pub ok: bool,
    pub problems: Vec<String>,
    pub missing_price_keys: Vec<String>,
    pub env: SquareEnvironment,
}

/// GET /selftest
///
/// Always answers 200; `ok` says whether checkout can work.
#[instrument(skip_all)]
pub async fn selftest(State(state): State<AppState>) -> Json<SelfTestReport> {
    let config = state.config();

    let mut problems: Vec<String> = config
        .square
        .missing_credentials()
        .into_iter()
        .map(|name| format!("{name} is not set"))
        .collect();

    let health = state.prices().health_check(&config.prices.required_keys);
    if !health.ok {
        problems.push(format!(
            "price table is missing {} required item(s)",
            health.missing_keys.len()
        ));
    }

    Json(SelfTestReport {
        ok: problems.is_empty(),
        problems,
        missing_price_keys: health.missing_keys,
        env: config.square.environment,
    })
}
