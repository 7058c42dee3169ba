//! Sun position and lunar phase.
//!
//! Closed-form functions of time with no failure modes: an unknown timezone
//! falls back to UTC, an empty or inverted daylight window yields 0 %.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::helpers::{localize, resolve_timezone};
use crate::models::SunPosition;

/// Mean length of a lunar cycle in days.
const SYNODIC_MONTH_DAYS: f64 = 29.530589;

/// A known new moon (2000-01-06 18:14 UTC) used as the phase epoch.
fn reference_new_moon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .unwrap_or_default()
}

/// Sun position for local wall-clock `now`, `sunrise` and `sunset` in `timezone`.
pub fn compute_sun_position(
    now: NaiveDateTime,
    sunrise: NaiveDateTime,
    sunset: NaiveDateTime,
    timezone: &str,
) -> SunPosition {
    let tz = resolve_timezone(timezone);
    let now = localize(tz, now);
    let sunrise = localize(tz, sunrise);
    let sunset = localize(tz, sunset);

    let daylight_secs = (sunset - sunrise).num_seconds();
    let daylight_mins = daylight_secs.max(0) / 60;

    let sun_position_pct = if daylight_secs > 0 {
        let elapsed = (now - sunrise).num_seconds() as f64;
        (elapsed / daylight_secs as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let moon_phase = compute_lunar_phase(now.with_timezone(&Utc));

    SunPosition {
        sunrise_time: sunrise.format("%H:%M").to_string(),
        sunset_time: sunset.format("%H:%M").to_string(),
        current_time: now.format("%H:%M").to_string(),
        sun_position_pct,
        is_day: now >= sunrise && now < sunset,
        daylight_hours: format!("{}h {}m", daylight_mins / 60, daylight_mins % 60),
        moon_phase,
        moon_phase_name: lunar_phase_name(moon_phase).to_string(),
    }
}

/// Lunar phase in [0, 1): 0 = new, 0.25 = first quarter, 0.5 = full, 0.75 = last quarter.
pub fn compute_lunar_phase(instant: DateTime<Utc>) -> f64 {
    let days = (instant - reference_new_moon()).num_seconds() as f64 / 86_400.0;
    let phase = days.rem_euclid(SYNODIC_MONTH_DAYS) / SYNODIC_MONTH_DAYS;
    // rem_euclid can round up to exactly the divisor for tiny negative inputs.
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

/// Name of the moon phase for a fraction in [0, 1).
pub fn lunar_phase_name(phase: f64) -> &'static str {
    match phase {
        p if !(0.034..0.966).contains(&p) => "New Moon",
        p if p < 0.216 => "Waxing Crescent",
        p if p < 0.284 => "First Quarter",
        p if p < 0.466 => "Waxing Gibbous",
        p if p < 0.534 => "Full Moon",
        p if p < 0.716 => "Waning Gibbous",
        p if p < 0.784 => "Last Quarter",
        _ => "Waning Crescent",
    }
}
