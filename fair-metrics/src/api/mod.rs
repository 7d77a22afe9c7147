//! HTTP API handlers

pub mod evaluate;
pub mod health;

pub use evaluate::metric_routes;
pub use health::health_routes;

use crate::error::ApiError;
use axum::http::Uri;

/// Fallback for every unknown route
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
