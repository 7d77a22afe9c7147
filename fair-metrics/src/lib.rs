//! fair-metrics library interface
//!
//! FAIR metric tests served over HTTP. The library holds the metadata
//! resolution pipeline, the evaluation session and the metric registry so
//! integration tests can drive them directly.

pub mod api;
pub mod error;
pub mod evaluation;
pub mod extract;
pub mod harvest;
pub mod identifier;
pub mod logging;
pub mod metrics;
pub mod rdf;
pub mod vocab;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use fair_common::Settings;
use harvest::{HarvestError, MetadataHarvester};
use metrics::MetricRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub harvester: Arc<MetadataHarvester>,
    pub registry: Arc<MetricRegistry>,
    /// Client for the metric tests' own lookups (DataCite, SPDX, LOV)
    pub client: reqwest::Client,
    pub startup_time: DateTime<Utc>,
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, HarvestError> {
        Self::with_registry(settings, MetricRegistry::builtin())
    }

    pub fn with_registry(settings: Settings, registry: MetricRegistry) -> Result<Self, HarvestError> {
        let harvester = MetadataHarvester::new(&settings)?;
        let client = harvester.client().clone();
        Ok(Self {
            settings: Arc::new(settings),
            harvester: Arc::new(harvester),
            registry: Arc::new(registry),
            client,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors_enabled = state.settings.cors_enabled;

    let router = Router::new()
        .merge(api::metric_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
