//! Report data model.
//!
//! Every value here is built once per pipeline run and never mutated after
//! the report is returned; cached reports are shared behind an `Arc`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::outfit::OutfitAdvice;
use crate::services::uv::UvLevel;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    /// IANA timezone name (e.g. "Europe/Zurich")
    #[serde(default)]
    pub timezone: String,
}

/// Unit system requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Lenient parse: "imperial" selects imperial, anything else is metric.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("imperial") => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    /// Label used in cache keys and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// "°C" or "°F".
    pub fn temp_symbol(self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    /// "km/h" or "mph".
    pub fn wind_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    /// `temperature_unit` query value for the forecast service.
    pub fn api_temperature_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "celsius",
            UnitSystem::Imperial => "fahrenheit",
        }
    }

    /// `wind_speed_unit` query value for the forecast service.
    pub fn api_wind_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "kmh",
            UnitSystem::Imperial => "mph",
        }
    }
}

/// Current conditions from the primary forecast model.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentConditions {
    /// Local observation time ("YYYY-MM-DDTHH:MM")
    pub time: String,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    /// Relative humidity percentage
    pub humidity: Option<i32>,
    /// Cloud cover percentage
    pub cloud_cover: Option<i32>,
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0 = north)
    pub wind_direction: Option<i32>,
    /// 8-point compass label for `wind_direction`
    pub wind_compass: Option<String>,
    /// Mean sea-level pressure in hPa
    pub pressure: Option<f64>,
    pub dew_point: Option<f64>,
    pub uv_index: Option<f64>,
    /// Exposure category for `uv_index`
    pub uv_level: Option<UvLevel>,
    /// Sun-protection advice for `uv_level`
    pub uv_advice: Option<String>,
    /// WMO weather code
    pub weather_code: Option<i32>,
    pub description: String,
    /// Weather-icons CSS class (e.g. "wi-day-sunny")
    pub icon: String,
}

/// One calendar day of the forecast.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyForecastEntry {
    /// Local date ("YYYY-MM-DD")
    pub date: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub wind_max: Option<f64>,
    /// Maximum precipitation probability (0-100)
    pub precipitation_probability: Option<i32>,
    pub weather_code: i32,
    pub description: String,
    pub icon: String,
}

/// One hour of the next-24-hours slice.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HourlyPoint {
    /// Local time of day ("HH:MM")
    pub time: String,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<i32>,
    pub wind_speed: Option<f64>,
    pub weather_code: Option<i32>,
    pub description: String,
    pub icon: String,
}

/// Sun and moon state at the report's "now".
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SunPosition {
    /// Local sunrise ("HH:MM")
    pub sunrise_time: String,
    /// Local sunset ("HH:MM")
    pub sunset_time: String,
    /// Local current time ("HH:MM")
    pub current_time: String,
    /// Elapsed fraction of daylight, 0-100 (clamped)
    pub sun_position_pct: f64,
    pub is_day: bool,
    /// Daylight duration, e.g. "12h 0m"
    pub daylight_hours: String,
    /// Lunar phase in [0, 1): 0 = new moon, 0.5 = full moon
    pub moon_phase: f64,
    pub moon_phase_name: String,
}

/// Current conditions reported by one forecast model.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelReading {
    pub model: String,
    pub temperature: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub pressure: f64,
    pub weather_code: i32,
    pub available: bool,
    /// Why the model is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelReading {
    /// Reading for a model that failed or returned incomplete data.
    pub fn unavailable(model: &str, error: String) -> Self {
        Self {
            model: model.to_string(),
            temperature: 0.0,
            humidity: 0,
            wind_speed: 0.0,
            pressure: 0.0,
            weather_code: 0,
            available: false,
            error: Some(error),
        }
    }
}

/// Qualitative cross-model agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Agreement {
    High,
    Moderate,
    Low,
}

impl Agreement {
    /// High at 80 % and above, Moderate at 50 % and above.
    pub fn from_pct(pct: i32) -> Self {
        match pct {
            p if p >= 80 => Agreement::High,
            p if p >= 50 => Agreement::Moderate,
            _ => Agreement::Low,
        }
    }
}

/// Agreement statistics over the available model readings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsensusSummary {
    /// One reading per configured model, available or not
    pub models: Vec<ModelReading>,
    pub avail_count: usize,
    pub avg_temp: f64,
    pub avg_humidity: i32,
    pub avg_wind: f64,
    pub avg_pressure: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    /// max_temp - min_temp
    pub spread: f64,
    pub agreement: Agreement,
    /// 0-100
    pub agree_pct: i32,
}

/// The aggregate weather report for one place and unit system.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Report {
    pub location: Location,
    pub units: UnitSystem,
    /// "°C" or "°F"
    pub temp_unit: String,
    /// "km/h" or "mph"
    pub wind_unit: String,
    pub current: CurrentConditions,
    pub daily: Vec<DailyForecastEntry>,
    pub hourly: Vec<HourlyPoint>,
    /// Absent when sunrise/sunset or the current time are unavailable
    pub sun: Option<SunPosition>,
    /// Absent means consensus was not computed; not a failure
    pub consensus: Option<ConsensusSummary>,
    pub outfit: OutfitAdvice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_system_from_param() {
        assert_eq!(UnitSystem::from_param(Some("imperial")), UnitSystem::Imperial);
        assert_eq!(UnitSystem::from_param(Some("IMPERIAL ")), UnitSystem::Imperial);
        assert_eq!(UnitSystem::from_param(Some("metric")), UnitSystem::Metric);
        assert_eq!(UnitSystem::from_param(Some("kelvin")), UnitSystem::Metric);
        assert_eq!(UnitSystem::from_param(None), UnitSystem::Metric);
    }

    #[test]
    fn test_unit_labels_are_consistent() {
        assert_eq!(UnitSystem::Metric.temp_symbol(), "°C");
        assert_eq!(UnitSystem::Metric.wind_label(), "km/h");
        assert_eq!(UnitSystem::Metric.api_temperature_unit(), "celsius");
        assert_eq!(UnitSystem::Imperial.temp_symbol(), "°F");
        assert_eq!(UnitSystem::Imperial.wind_label(), "mph");
        assert_eq!(UnitSystem::Imperial.api_wind_unit(), "mph");
    }

    #[test]
    fn test_agreement_thresholds() {
        assert_eq!(Agreement::from_pct(100), Agreement::High);
        assert_eq!(Agreement::from_pct(80), Agreement::High);
        assert_eq!(Agreement::from_pct(79), Agreement::Moderate);
        assert_eq!(Agreement::from_pct(50), Agreement::Moderate);
        assert_eq!(Agreement::from_pct(49), Agreement::Low);
        assert_eq!(Agreement::from_pct(0), Agreement::Low);
    }

    #[test]
    fn test_location_decodes_with_missing_optional_fields() {
        let loc: Location = serde_json::from_value(serde_json::json!({
            "name": "Nowhere",
            "latitude": 1.5,
            "longitude": 2.5
        }))
        .unwrap();
        assert_eq!(loc.timezone, "");
        assert_eq!(loc.country_code, "");
    }
}
