//! Metric test endpoints
//!
//! `POST /tests/:metric_path` evaluates a subject, `GET` on the same path
//! returns the Swagger descriptor, `GET /` lists the metrics.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics::descriptor::{swagger_yaml, YAML_CONTENT_TYPE};
use crate::metrics::{run_metric, EvaluationContext, MetricTest};
use crate::AppState;
use std::sync::Arc;

pub const API_TITLE: &str = "FAIR Metrics tests API";
pub const API_DESCRIPTION: &str = "FAIR Metrics tests API for online resources. \
Each metric checks one of the FAIR principles. \
Each test takes the identifier (URL, DOI or handle) of a resource as subject and returns a JSON-LD evaluation result.";

/// POST body of a metric test
#[derive(Debug, Default, Deserialize)]
pub struct TestInput {
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub metric_path: String,
    pub url: String,
    pub applies_to_principle: String,
    pub title: String,
    pub metric_version: String,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub title: String,
    pub description: String,
    pub version: String,
    pub license: String,
    pub metrics: Vec<MetricSummary>,
}

/// GET /
pub async fn list_metrics(State(state): State<AppState>) -> Json<IndexResponse> {
    let host_url = state.settings.host_url.trim_end_matches('/');
    let metrics = state
        .registry
        .iter()
        .map(|metric| {
            let info = metric.info();
            MetricSummary {
                metric_path: info.metric_path.to_string(),
                url: format!("{host_url}/tests/{}", info.metric_path),
                applies_to_principle: info.applies_to_principle.to_string(),
                title: info.title.to_string(),
                metric_version: info.metric_version.to_string(),
            }
        })
        .collect();

    Json(IndexResponse {
        title: API_TITLE.to_string(),
        description: API_DESCRIPTION.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        license: "MIT".to_string(),
        metrics,
    })
}

/// POST /tests/:metric_path
pub async fn evaluate_subject(
    State(state): State<AppState>,
    Path(metric_path): Path<String>,
    payload: Result<Json<TestInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let metric = find_metric(&state, &metric_path)?;
    let Json(input) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let subject = input
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unprocessable("Provide a subject to evaluate".to_string()))?;

    info!(metric = %metric_path, subject = %subject, "Evaluating subject");
    let ctx = EvaluationContext {
        harvester: &state.harvester,
        client: &state.client,
        settings: &state.settings,
    };
    let eval = run_metric(metric.as_ref(), subject, &ctx).await;
    Ok(Json(eval.to_json_ld()))
}

/// GET /tests/:metric_path
pub async fn metric_descriptor(
    State(state): State<AppState>,
    Path(metric_path): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let metric = find_metric(&state, &metric_path)?;
    let yaml = match swagger_yaml(metric.info(), &state.settings) {
        Ok(yaml) => yaml,
        Err(e) => {
            error!(metric = %metric_path, error = %e, "Could not render descriptor");
            *state.last_error.write().await = Some(e.to_string());
            return Err(ApiError::Internal(format!("Could not render descriptor: {e}")));
        }
    };
    Ok(([(CONTENT_TYPE, YAML_CONTENT_TYPE)], yaml))
}

fn find_metric(state: &AppState, metric_path: &str) -> ApiResult<Arc<dyn MetricTest>> {
    state
        .registry
        .get(metric_path)
        .ok_or_else(|| ApiError::NotFound(format!("No metric test at /tests/{metric_path}")))
}

pub fn metric_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_metrics))
        .route(
            "/tests/:metric_path",
            get(metric_descriptor).post(evaluate_subject),
        )
}
