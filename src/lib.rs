//! LogTriage -- access-log traffic anomaly triage.
//!
//! This crate provides the core library for parsing web-server access logs,
//! aggregating per-address request-count time series, running multiple
//! unsupervised outlier-detection strategies, and scoring each strategy
//! against a ground-truth anomaly set.

pub mod analysis;
pub mod api;
pub mod config;
pub mod detect;
pub mod ingest;
pub mod report;

use anyhow::Result;

/// Start the LogTriage daemon: JSON API serving triage reports for a log file.
pub async fn serve(bind: &str, log_path: &str, config: config::TriageConfig) -> Result<()> {
    let state = api::state::AppState {
        config,
        log_path: log_path.to_string(),
    };
    let app = api::router(state);

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, %log_path, "LogTriage listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
