//! Report cache status endpoint.
//!
//! GET /api/v1/cache/status

use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::services::cache::CacheStatus;

/// Current cache occupancy and configuration.
///
/// `entries` includes expired reports that the periodic sweep has not yet
/// removed.
#[utoipa::path(
    get,
    path = "/api/v1/cache/status",
    tag = "Cache",
    responses(
        (status = 200, description = "Cache status", body = CacheStatus),
    )
)]
pub async fn get_cache_status(State(state): State<AppState>) -> Json<CacheStatus> {
    Json(state.cache.status().await)
}
