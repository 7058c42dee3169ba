//! Multi-model consensus.
//!
//! Current conditions are fetched from every configured model concurrently and
//! joined with an all-complete barrier. A failing model becomes an unavailable
//! reading; the aggregate is always returned.

use futures::future::join_all;
use reqwest::Url;
use serde::Deserialize;

use crate::helpers::{request_timezone, round_1dp};
use crate::models::{Agreement, ConsensusSummary, Location, ModelReading, UnitSystem};
use crate::services::gateway::Gateway;

/// Display name and forecast-service model id.
pub const FORECAST_MODELS: &[(&str, &str)] = &[
    ("ECMWF", "ecmwf_ifs025"),
    ("ICON", "icon_seamless"),
    ("Météo-France", "meteofrance_seamless"),
    ("MET Norway", "metno_seamless"),
];

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,pressure_msl,weather_code";

/// Agreement points lost per degree of temperature spread.
const PENALTY_PER_DEGREE: f64 = 12.0;

#[derive(Debug, Deserialize)]
struct ModelResponse {
    #[serde(default)]
    current: ModelCurrent,
}

#[derive(Debug, Default, Deserialize)]
struct ModelCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<i32>,
    wind_speed_10m: Option<f64>,
    pressure_msl: Option<f64>,
    weather_code: Option<i32>,
}

/// Fetches current conditions from several forecast models and aggregates them.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    gateway: Gateway,
    forecast_url: Url,
    models: Vec<(String, String)>,
}

impl ConsensusEngine {
    /// `gateway` should already carry the short per-model timeout.
    pub fn new(gateway: Gateway, forecast_url: Url) -> Self {
        Self {
            gateway,
            forecast_url,
            models: FORECAST_MODELS
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn with_models(mut self, models: &[(&str, &str)]) -> Self {
        self.models = models
            .iter()
            .map(|(name, id)| (name.to_string(), id.to_string()))
            .collect();
        self
    }

    /// Query every model concurrently and summarize the readings.
    ///
    /// Never fails: a model that errors or returns incomplete data is reported
    /// as unavailable.
    pub async fn fetch_consensus(&self, location: &Location, units: UnitSystem) -> ConsensusSummary {
        let fetches = self
            .models
            .iter()
            .map(|(name, id)| self.fetch_model(name, id, location, units));
        let readings = join_all(fetches).await;

        let summary = summarize(readings);
        tracing::debug!(
            "Consensus for {}: {}/{} models, spread {} ({:?})",
            location.name,
            summary.avail_count,
            summary.models.len(),
            summary.spread,
            summary.agreement
        );
        summary
    }

    async fn fetch_model(
        &self,
        name: &str,
        model_id: &str,
        location: &Location,
        units: UnitSystem,
    ) -> ModelReading {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &format!("{:.4}", location.latitude))
            .append_pair("longitude", &format!("{:.4}", location.longitude))
            .append_pair("current", CURRENT_FIELDS)
            .append_pair("temperature_unit", units.api_temperature_unit())
            .append_pair("wind_speed_unit", units.api_wind_unit())
            .append_pair("timezone", request_timezone(location))
            .append_pair("models", model_id);

        let response: ModelResponse = match self.gateway.fetch_json(&url).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Model {} unavailable: {}", name, e);
                return ModelReading::unavailable(name, e.to_string());
            }
        };

        let current = response.current;
        let (Some(temperature), Some(humidity)) =
            (current.temperature_2m, current.relative_humidity_2m)
        else {
            tracing::warn!("Model {} returned incomplete data", name);
            return ModelReading::unavailable(name, "incomplete data".to_string());
        };

        ModelReading {
            model: name.to_string(),
            temperature,
            humidity,
            wind_speed: current.wind_speed_10m.unwrap_or(0.0),
            pressure: current.pressure_msl.unwrap_or(0.0),
            weather_code: current.weather_code.unwrap_or(0),
            available: true,
            error: None,
        }
    }
}

/// Agreement statistics over the available readings. Zero available readings
/// leave every numeric field at zero with a `Low` label.
pub fn summarize(readings: Vec<ModelReading>) -> ConsensusSummary {
    let available: Vec<&ModelReading> = readings.iter().filter(|r| r.available).collect();
    let count = available.len();

    if count == 0 {
        return ConsensusSummary {
            models: readings,
            avail_count: 0,
            avg_temp: 0.0,
            avg_humidity: 0,
            avg_wind: 0.0,
            avg_pressure: 0.0,
            min_temp: 0.0,
            max_temp: 0.0,
            spread: 0.0,
            agreement: Agreement::Low,
            agree_pct: 0,
        };
    }

    let n = count as f64;
    let sum_temp: f64 = available.iter().map(|r| r.temperature).sum();
    let sum_wind: f64 = available.iter().map(|r| r.wind_speed).sum();
    let sum_pressure: f64 = available.iter().map(|r| r.pressure).sum();
    let sum_humidity: i64 = available.iter().map(|r| i64::from(r.humidity)).sum();
    let min_temp = available
        .iter()
        .map(|r| r.temperature)
        .fold(f64::INFINITY, f64::min);
    let max_temp = available
        .iter()
        .map(|r| r.temperature)
        .fold(f64::NEG_INFINITY, f64::max);

    let min_temp = round_1dp(min_temp);
    let max_temp = round_1dp(max_temp);
    let spread = round_1dp(max_temp - min_temp).max(0.0);
    let agree_pct = (100 - (spread * PENALTY_PER_DEGREE) as i32).clamp(0, 100);

    ConsensusSummary {
        avail_count: count,
        avg_temp: round_1dp(sum_temp / n),
        avg_humidity: (sum_humidity / count as i64) as i32,
        avg_wind: round_1dp(sum_wind / n),
        avg_pressure: round_1dp(sum_pressure / n),
        min_temp,
        max_temp,
        spread,
        agreement: Agreement::from_pct(agree_pct),
        agree_pct,
        models: readings,
    }
}
