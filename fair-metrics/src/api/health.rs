//! `GET /health`: liveness plus what this instance evaluates with

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub profile: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub build: BuildInfo,
    pub uptime_seconds: u64,
    /// Number of metric tests served under `/tests/`
    pub metric_count: usize,
    pub harvester_url: String,
    /// Public base URL used in result identifiers
    pub host_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    Json(HealthResponse {
        status: "ok",
        module: "fair-metrics",
        build: BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            profile: env!("BUILD_PROFILE"),
        },
        uptime_seconds,
        metric_count: state.registry.len(),
        harvester_url: state.settings.harvester_url.clone(),
        host_url: state.settings.host_url.clone(),
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
