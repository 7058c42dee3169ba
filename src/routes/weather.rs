//! Weather report endpoint.
//!
//! - GET /api/v1/weather?city=<place>&units=<metric|imperial>
//!
//! Reports are served from the report cache when fresh; only successful
//! pipeline runs are cached. `X-Cache` tells the client which path was taken.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::AppState;
use crate::errors::{AppError, ErrorResponse};
use crate::models::{Report, UnitSystem};
use crate::services::alerts::{evaluate_alerts, Alert};
use crate::services::cache::ReportCache;

/// Response header carrying "HIT" or "MISS".
pub const X_CACHE: &str = "x-cache";

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// Place name (e.g. "Zurich")
    pub city: Option<String>,
    /// "metric" (default) or "imperial"
    pub units: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    #[schema(value_type = Report)]
    pub report: Arc<Report>,
    /// Triggered alerts, most severe first
    pub alerts: Vec<Alert>,
    /// Whether the report came from the cache
    pub cached: bool,
}

/// Get the aggregated weather report for a place.
///
/// Geocodes the place, fetches the primary forecast and the multi-model
/// consensus concurrently, and attaches alerts and an outfit suggestion.
#[utoipa::path(
    get,
    path = "/api/v1/weather",
    tag = "Weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Weather report", body = WeatherResponse,
            headers(("X-Cache" = String, description = "HIT or MISS"))),
        (status = 400, description = "Missing or invalid place name", body = ErrorResponse),
        (status = 404, description = "Place not found", body = ErrorResponse),
        (status = 502, description = "Upstream service error", body = ErrorResponse),
        (status = 503, description = "Upstream unreachable or deadline exceeded", body = ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Response, AppError> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing required query parameter 'city'".into()))?;
    let units = UnitSystem::from_param(query.units.as_deref());
    let key = ReportCache::cache_key(city, units);

    if let Some(report) = state.cache.get(&key).await {
        tracing::debug!("Cache hit for {}", key);
        return Ok(weather_response(report, true));
    }

    let report = Arc::new(state.forecast.get_weather(city, units).await?);
    state.cache.set(key, Arc::clone(&report)).await;
    tracing::info!(
        "Built report for {} ({}), {} daily / {} hourly",
        report.location.name,
        units.as_str(),
        report.daily.len(),
        report.hourly.len()
    );

    Ok(weather_response(report, false))
}

fn weather_response(report: Arc<Report>, cached: bool) -> Response {
    let alerts = evaluate_alerts(&report);
    let marker = if cached { "HIT" } else { "MISS" };
    (
        [(X_CACHE, marker)],
        Json(WeatherResponse {
            report,
            alerts,
            cached,
        }),
    )
        .into_response()
}
