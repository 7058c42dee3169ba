//! Reverse geocoding endpoint.
//!
//! - GET /api/v1/reverse?lat=<f64>&lon=<f64>

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::AppState;
use crate::errors::{AppError, ErrorResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReverseQuery {
    /// Latitude in degrees (-90 to 90)
    pub lat: Option<String>,
    /// Longitude in degrees (-180 to 180)
    pub lon: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReverseResponse {
    /// Most specific place name for the coordinates
    pub city: String,
}

/// Resolve coordinates to a place name.
#[utoipa::path(
    get,
    path = "/api/v1/reverse",
    tag = "Geocoding",
    params(ReverseQuery),
    responses(
        (status = 200, description = "Place name", body = ReverseResponse),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorResponse),
        (status = 404, description = "No place name for these coordinates", body = ErrorResponse),
        (status = 502, description = "Upstream service error", body = ErrorResponse),
    )
)]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>, AppError> {
    let lat = parse_coordinate("lat", query.lat.as_deref(), 90.0)?;
    let lon = parse_coordinate("lon", query.lon.as_deref(), 180.0)?;

    let city = state.geocoder.reverse_geocode(lat, lon).await?;
    Ok(Json(ReverseResponse { city }))
}

fn parse_coordinate(name: &str, raw: Option<&str>, limit: f64) -> Result<f64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("missing required query parameter '{}'", name)))?;

    let value: f64 = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("'{}' must be a number, got {:?}", name, raw)))?;

    if !value.is_finite() || value.abs() > limit {
        return Err(AppError::BadRequest(format!(
            "'{}' must be between -{} and {}",
            name, limit, limit
        )));
    }
    Ok(value)
}
