//! Shared numeric and time helpers.
//!
//! Upstream timestamps come in the location's local wall-clock time without an
//! offset ("2026-03-01T07:00"), so parsing always pairs them with an IANA zone.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::models::Location;

/// Timestamp layout used by the forecast service for local times.
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Round to 1 decimal place, half away from zero.
///
/// Returns 0 for non-finite inputs (NaN, ±Inf).
pub(crate) fn round_1dp(v: f64) -> f64 {
    if !v.is_finite() {
        tracing::warn!("round_1dp received non-finite value {}, defaulting to 0", v);
        return 0.0;
    }
    (v * 10.0).round() / 10.0
}

/// Resolve an IANA timezone name, falling back to UTC when it is unknown.
pub(crate) fn resolve_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone '{}', falling back to UTC", name);
        Tz::UTC
    })
}

/// Timezone name sent upstream; an empty geocoder zone becomes "UTC".
pub(crate) fn request_timezone(location: &Location) -> &str {
    if location.timezone.is_empty() {
        "UTC"
    } else {
        &location.timezone
    }
}

/// Parse a local "YYYY-MM-DDTHH:MM" timestamp (seconds tolerated).
pub(crate) fn parse_local_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, LOCAL_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Attach a timezone to a wall-clock time.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are shifted forward by the gap's hour.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Read index `i` of a parallel upstream array, treating short arrays and nulls as absent.
pub(crate) fn value_at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_round_1dp_normal() {
        assert_eq!(round_1dp(3.14), 3.1);
        assert_eq!(round_1dp(3.16), 3.2);
        assert_eq!(round_1dp(-4.75), -4.8);
    }

    #[test]
    fn test_round_1dp_non_finite() {
        assert_eq!(round_1dp(f64::NAN), 0.0);
        assert_eq!(round_1dp(f64::INFINITY), 0.0);
        assert_eq!(round_1dp(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_resolve_timezone_known() {
        assert_eq!(resolve_timezone("Europe/Zurich"), chrono_tz::Europe::Zurich);
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
        assert_eq!(resolve_timezone(""), Tz::UTC);
    }

    #[test]
    fn test_request_timezone_defaults_to_utc() {
        let mut location = Location {
            name: "Null Island".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            country: String::new(),
            country_code: String::new(),
            timezone: String::new(),
        };
        assert_eq!(request_timezone(&location), "UTC");
        location.timezone = "Asia/Tokyo".to_string();
        assert_eq!(request_timezone(&location), "Asia/Tokyo");
    }

    #[test]
    fn test_parse_local_timestamp() {
        let t = parse_local_timestamp("2026-03-01T07:45").unwrap();
        assert_eq!(t.hour(), 7);
        assert_eq!(t.minute(), 45);
        assert!(parse_local_timestamp("2026-03-01T07:45:30").is_some());
        assert!(parse_local_timestamp("not a time").is_none());
        assert!(parse_local_timestamp("").is_none());
    }

    #[test]
    fn test_localize_dst_gap_shifts_forward() {
        // 02:30 does not exist in Zurich on 2026-03-29.
        let naive = parse_local_timestamp("2026-03-29T02:30").unwrap();
        let local = localize(chrono_tz::Europe::Zurich, naive);
        assert_eq!(local.hour(), 3);
    }

    #[test]
    fn test_value_at() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(value_at(&values, 0), Some(1.0));
        assert_eq!(value_at(&values, 1), None);
        assert_eq!(value_at(&values, 5), None);
    }
}
