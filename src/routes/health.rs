use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" while the process is serving)
    pub status: String,
    /// API version
    pub version: String,
    /// Reports currently held by the cache
    pub cache_entries: usize,
}

/// Health check endpoint.
///
/// Liveness only: upstream weather services are not probed, so a slow
/// provider never makes the service look down.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: state.cache.len().await,
    })
}
