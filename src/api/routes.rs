//! API route definitions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::report;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/report", get(triage_report))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Run the triage pipeline over the configured log file and return the full
/// report. Each request recomputes from scratch; the pipeline is a pure
/// function of the log file and configuration.
async fn triage_report(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let log_path = state.log_path.clone();
    let config = state.config.clone();

    let report = tokio::task::spawn_blocking(move || report::run_pipeline(&log_path, &config))
        .await
        .map_err(|e| report_error(e.to_string()))?
        .map_err(|e| report_error(e.to_string()))?;

    Ok(Json(json!({
        "data": report,
        "meta": {
            "log_path": state.log_path,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    })))
}

fn report_error(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}
