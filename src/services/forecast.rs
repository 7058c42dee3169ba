//! Forecast aggregation pipeline.
//!
//! geocode → primary forecast fetch (concurrently with the consensus
//! sub-fetch) → current conditions, daily sequence, sun position and hourly
//! slice → outfit enrichment.
//!
//! Geocoding and primary-forecast failures are fatal. Everything derived after
//! the primary fetch degrades to absent or empty instead of failing the report.
//! The whole run is bounded by a request-scoped deadline; in-flight sub-fetches
//! are dropped when it elapses.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use reqwest::Url;
use serde::Deserialize;

use crate::errors::{FetchError, WeatherError};
use crate::helpers::{
    localize, parse_local_timestamp, request_timezone, resolve_timezone, value_at,
};
use crate::models::{
    ConsensusSummary, CurrentConditions, DailyForecastEntry, HourlyPoint, Location, Report,
    SunPosition, UnitSystem,
};
use crate::services::astronomy::compute_sun_position;
use crate::services::consensus::ConsensusEngine;
use crate::services::gateway::Gateway;
use crate::services::geocoder::Geocoder;
use crate::services::outfit::build_outfit;
use crate::services::units::wind_compass;
use crate::services::uv::UvLevel;
use crate::services::wmo;

const FORECAST_SERVICE: &str = "forecast";

/// Days requested from, and kept of, the daily block.
const FORECAST_DAYS: usize = 5;

/// Hourly points kept, starting at the current hour.
const HOURLY_POINTS: usize = 24;

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,\
weather_code,cloud_cover,wind_speed_10m,wind_direction_10m,pressure_msl,dew_point_2m,uv_index";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
wind_speed_10m_max,precipitation_probability_max,sunrise,sunset";

// --- Forecast service JSON (parallel arrays, nulls decode to None) ---

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    current: RawCurrent,
    #[serde(default)]
    hourly: RawHourly,
    #[serde(default)]
    daily: RawDaily,
}

#[derive(Debug, Default, Deserialize)]
struct RawCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<i32>,
    weather_code: Option<i32>,
    cloud_cover: Option<i32>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<i32>,
    pressure_msl: Option<f64>,
    dew_point_2m: Option<f64>,
    uv_index: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHourly {
    time: Vec<Option<String>>,
    temperature_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<i32>>,
    weather_code: Vec<Option<i32>>,
    wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDaily {
    time: Vec<Option<String>>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<i32>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
}

/// Entry point of the aggregation pipeline.
#[derive(Debug, Clone)]
pub struct ForecastService {
    gateway: Gateway,
    geocoder: Geocoder,
    consensus: ConsensusEngine,
    forecast_url: Url,
    max_place_len: usize,
    deadline: Duration,
}

impl ForecastService {
    /// Wire the pipeline. `gateway` carries the primary request timeout.
    pub fn new(
        gateway: Gateway,
        geocoder: Geocoder,
        consensus: ConsensusEngine,
        forecast_url: Url,
        max_place_len: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            gateway,
            geocoder,
            consensus,
            forecast_url,
            max_place_len,
            deadline,
        }
    }

    /// Build the full report for `place` in `units`.
    pub async fn get_weather(&self, place: &str, units: UnitSystem) -> Result<Report, WeatherError> {
        let place = validate_place(place, self.max_place_len)?;

        match tokio::time::timeout(self.deadline, self.run_pipeline(place, units)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Weather pipeline for {:?} exceeded the {:?} deadline",
                    place,
                    self.deadline
                );
                Err(WeatherError::DeadlineExceeded(self.deadline.as_secs()))
            }
        }
    }

    async fn run_pipeline(&self, place: &str, units: UnitSystem) -> Result<Report, WeatherError> {
        let location = self.geocoder.geocode(place).await?;
        tracing::debug!(
            "Resolved {:?} to {} ({:.4}, {:.4}, {})",
            place,
            location.name,
            location.latitude,
            location.longitude,
            location.timezone
        );

        // Consensus never fails; a primary failure drops it early.
        let (raw, consensus) = tokio::try_join!(self.fetch_forecast(&location, units), async {
            Ok::<_, WeatherError>(self.consensus.fetch_consensus(&location, units).await)
        })?;

        assemble_report(location, units, raw, Some(consensus))
    }

    async fn fetch_forecast(
        &self,
        location: &Location,
        units: UnitSystem,
    ) -> Result<ForecastResponse, WeatherError> {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &format!("{:.4}", location.latitude))
            .append_pair("longitude", &format!("{:.4}", location.longitude))
            .append_pair("current", CURRENT_FIELDS)
            .append_pair("hourly", HOURLY_FIELDS)
            .append_pair("daily", DAILY_FIELDS)
            .append_pair("temperature_unit", units.api_temperature_unit())
            .append_pair("wind_speed_unit", units.api_wind_unit())
            .append_pair("timezone", request_timezone(location))
            .append_pair("forecast_days", &FORECAST_DAYS.to_string());

        self.gateway
            .fetch_json(&url)
            .await
            .map_err(|e| WeatherError::fetch(FORECAST_SERVICE, e))
    }
}

/// Trimmed place name, rejected when empty or longer than `max_len` characters.
fn validate_place(place: &str, max_len: usize) -> Result<&str, WeatherError> {
    let place = place.trim();
    if place.is_empty() {
        return Err(WeatherError::Validation(
            "place name must not be empty".to_string(),
        ));
    }
    if place.chars().count() > max_len {
        return Err(WeatherError::Validation(format!(
            "place name exceeds {} characters",
            max_len
        )));
    }
    Ok(place)
}

/// Assemble a report from a decoded primary response.
pub(crate) fn assemble_report(
    location: Location,
    units: UnitSystem,
    raw: ForecastResponse,
    consensus: Option<ConsensusSummary>,
) -> Result<Report, WeatherError> {
    let tz = resolve_timezone(request_timezone(&location));
    let current = build_current(&raw.current)?;
    let now = raw.current.time.as_deref().and_then(parse_local_timestamp);

    if now.is_none() {
        tracing::warn!(
            "Forecast for {} has no usable current time; sun and hourly omitted",
            location.name
        );
    }

    let sun = now.and_then(|now| build_sun(&raw.daily, now, &location.timezone));
    let hourly = now
        .map(|now| build_hourly(&raw.hourly, localize(tz, now), tz))
        .unwrap_or_default();

    let mut report = Report {
        temp_unit: units.temp_symbol().to_string(),
        wind_unit: units.wind_label().to_string(),
        location,
        units,
        current,
        daily: build_daily(&raw.daily),
        hourly,
        sun,
        consensus,
        outfit: Default::default(),
    };
    report.outfit = build_outfit(&report);
    Ok(report)
}

fn build_current(raw: &RawCurrent) -> Result<CurrentConditions, WeatherError> {
    let temperature = raw.temperature_2m.ok_or_else(|| {
        WeatherError::fetch(
            FORECAST_SERVICE,
            FetchError::Decode("current.temperature_2m missing".to_string()),
        )
    })?;
    let condition = raw.weather_code.map(wmo::decode).unwrap_or(wmo::UNKNOWN);
    let uv_level = raw.uv_index.map(UvLevel::from_index);

    Ok(CurrentConditions {
        time: raw.time.clone().unwrap_or_default(),
        temperature,
        feels_like: raw.apparent_temperature,
        humidity: raw.relative_humidity_2m,
        cloud_cover: raw.cloud_cover,
        wind_speed: raw.wind_speed_10m,
        wind_direction: raw.wind_direction_10m,
        wind_compass: raw.wind_direction_10m.map(|d| wind_compass(d).to_string()),
        pressure: raw.pressure_msl,
        dew_point: raw.dew_point_2m,
        uv_index: raw.uv_index,
        uv_level,
        uv_advice: uv_level.map(|level| level.advice().to_string()),
        weather_code: raw.weather_code,
        description: condition.description.to_string(),
        icon: condition.icon.to_string(),
    })
}

/// Zip the daily arrays, stopping at the first index missing a required field.
fn build_daily(raw: &RawDaily) -> Vec<DailyForecastEntry> {
    let mut days = Vec::with_capacity(FORECAST_DAYS);

    for (i, date) in raw.time.iter().enumerate().take(FORECAST_DAYS) {
        let (Some(date), Some(code), Some(temp_max), Some(temp_min)) = (
            date.as_ref(),
            value_at(&raw.weather_code, i),
            value_at(&raw.temperature_2m_max, i),
            value_at(&raw.temperature_2m_min, i),
        ) else {
            tracing::debug!("Daily block truncated at index {}", i);
            break;
        };

        let condition = wmo::decode(code);
        days.push(DailyForecastEntry {
            date: date.clone(),
            temp_max,
            temp_min,
            wind_max: value_at(&raw.wind_speed_10m_max, i),
            precipitation_probability: value_at(&raw.precipitation_probability_max, i),
            weather_code: code,
            description: condition.description.to_string(),
            icon: condition.icon.to_string(),
        });
    }

    days
}

/// Sun position from today's sunrise/sunset, when both are present and parseable.
fn build_sun(raw: &RawDaily, now: NaiveDateTime, timezone: &str) -> Option<SunPosition> {
    let sunrise = raw.sunrise.first()?.as_deref().and_then(parse_local_timestamp)?;
    let sunset = raw.sunset.first()?.as_deref().and_then(parse_local_timestamp)?;
    Some(compute_sun_position(now, sunrise, sunset, timezone))
}

/// Hourly points at or after `now`, chronological, at most 24.
fn build_hourly(raw: &RawHourly, now: DateTime<Tz>, tz: Tz) -> Vec<HourlyPoint> {
    let mut points = Vec::with_capacity(HOURLY_POINTS);
    let mut last = now;

    for (i, ts) in raw.time.iter().enumerate() {
        if points.len() >= HOURLY_POINTS {
            break;
        }
        let Some(t) = ts.as_deref().and_then(parse_local_timestamp) else {
            continue;
        };
        let t = localize(tz, t);
        if t < last {
            continue;
        }
        last = t;

        let code = value_at(&raw.weather_code, i);
        let condition = code.map(wmo::decode).unwrap_or(wmo::UNKNOWN);
        points.push(HourlyPoint {
            time: t.format("%H:%M").to_string(),
            temperature: value_at(&raw.temperature_2m, i),
            precipitation_probability: value_at(&raw.precipitation_probability, i),
            wind_speed: value_at(&raw.wind_speed_10m, i),
            weather_code: code,
            description: condition.description.to_string(),
            icon: condition.icon.to_string(),
        });
    }

    points
}
