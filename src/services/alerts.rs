//! Weather alert rules.
//!
//! Pure function of a finished report. Alerts come back grouped by severity:
//! danger, then warning, then info.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Report;
use crate::services::units::{to_celsius, to_kmh};

/// Alert severity, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Danger,
    Warning,
    Info,
}

/// A single weather alert shown with a report.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Alert {
    pub level: AlertLevel,
    /// Weather-icons CSS class
    pub icon: String,
    pub title: String,
    pub message: String,
}

impl Alert {
    fn new(level: AlertLevel, icon: &str, title: &str, message: &str) -> Self {
        Self {
            level,
            icon: icon.to_string(),
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

/// Evaluate every alert rule against a report.
///
/// Thresholds compare metric values; imperial reports are converted first.
/// The result is ordered danger, then warning, then info.
pub fn evaluate_alerts(report: &Report) -> Vec<Alert> {
    let current = &report.current;
    let temp_c = to_celsius(current.temperature, &report.temp_unit);
    let feels_c = to_celsius(
        current.feels_like.unwrap_or(current.temperature),
        &report.temp_unit,
    );
    let wind_kmh = to_kmh(current.wind_speed.unwrap_or(0.0), &report.wind_unit);
    let humidity = current.humidity.unwrap_or(0);
    let icon = current.icon.as_str();

    let mut alerts = Vec::new();

    if matches!(icon, "wi-thunderstorm" | "wi-storm-showers") {
        alerts.push(Alert::new(
            AlertLevel::Danger,
            "wi-thunderstorm",
            "THUNDERSTORM ACTIVE",
            "Lightning risk. Stay indoors. Unplug electronics. Avoid open areas.",
        ));
    }
    if feels_c <= -15.0 {
        alerts.push(Alert::new(
            AlertLevel::Danger,
            "wi-snowflake-cold",
            "EXTREME COLD",
            "Dangerously cold. Risk of frostbite in under 30 minutes. Limit time outdoors.",
        ));
    }
    if feels_c >= 40.0 {
        alerts.push(Alert::new(
            AlertLevel::Danger,
            "wi-hot",
            "EXTREME HEAT",
            "Heat index critical. Risk of heat stroke. Stay in the shade and hydrate constantly.",
        ));
    }
    if wind_kmh >= 118.0 {
        alerts.push(Alert::new(
            AlertLevel::Danger,
            "wi-strong-wind",
            "HURRICANE-FORCE WIND",
            "Extremely dangerous winds. Take shelter immediately. Do not drive.",
        ));
    }

    if icon == "wi-rain-wind" {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "wi-rain-wind",
            "HEAVY RAIN",
            "Reduced visibility and possible flash flooding. Drive carefully.",
        ));
    }
    if icon == "wi-snow-wind" {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "wi-snow-wind",
            "HEAVY SNOW",
            "Roads may be impassable. Allow extra travel time and check road conditions.",
        ));
    }
    // Extreme cold covers <= -15.
    if temp_c < 0.0 && temp_c > -15.0 {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "wi-thermometer-exterior",
            "FREEZING CONDITIONS",
            "Black ice possible on roads. Wrap up warm and watch your step.",
        ));
    }
    if (35.0..40.0).contains(&feels_c) {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "wi-day-sunny",
            "HEATWAVE WARNING",
            "Dangerously warm. Drink water, avoid peak sun hours (11am to 3pm), check on vulnerable people.",
        ));
    }
    if (62.0..118.0).contains(&wind_kmh) {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "wi-strong-wind",
            "STRONG WIND WARNING",
            "Gale-force winds. Secure loose outdoor objects. Drive with care.",
        ));
    }

    if icon == "wi-fog" {
        alerts.push(Alert::new(
            AlertLevel::Info,
            "wi-fog",
            "FOG ADVISORY",
            "Low visibility on roads. Use fog lights and reduce speed.",
        ));
    }
    if humidity >= 85 {
        alerts.push(Alert::new(
            AlertLevel::Info,
            "wi-humidity",
            "HIGH HUMIDITY",
            "Air feels heavy and muggy. Stay hydrated and take it easy outdoors.",
        ));
    }
    if (39.0..62.0).contains(&wind_kmh) {
        alerts.push(Alert::new(
            AlertLevel::Info,
            "wi-windy",
            "WINDY CONDITIONS",
            "Fresh to strong breeze. Hold onto your hat, literally.",
        ));
    }

    alerts
}
