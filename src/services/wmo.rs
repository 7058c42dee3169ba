//! WMO weather interpretation codes.
//!
//! Total mapping: every integer decodes to a description and a weather-icons
//! class, with an explicit unknown bucket.

/// Decoded weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub description: &'static str,
    pub icon: &'static str,
}

/// Fallback for codes outside the table.
pub const UNKNOWN: Condition = Condition {
    description: "Unknown",
    icon: "wi-na",
};

/// (first code, last code, description, icon), inclusive ranges.
const WMO_TABLE: &[(i32, i32, &str, &str)] = &[
    (0, 0, "Clear sky", "wi-day-sunny"),
    (1, 1, "Mainly clear", "wi-day-sunny-overcast"),
    (2, 2, "Partly cloudy", "wi-day-cloudy"),
    (3, 3, "Overcast", "wi-cloudy"),
    (45, 45, "Fog", "wi-fog"),
    (48, 48, "Fog", "wi-fog"),
    (51, 53, "Light drizzle", "wi-sprinkle"),
    (55, 55, "Dense drizzle", "wi-rain-mix"),
    (61, 61, "Slight rain", "wi-rain-mix"),
    (63, 63, "Moderate rain", "wi-rain"),
    (65, 65, "Heavy rain", "wi-rain-wind"),
    (71, 71, "Slight snow", "wi-snow"),
    (73, 73, "Moderate snow", "wi-snow"),
    (75, 75, "Heavy snow", "wi-snow-wind"),
    (77, 77, "Snow grains", "wi-snowflake-cold"),
    (80, 82, "Rain showers", "wi-showers"),
    (85, 86, "Snow showers", "wi-snow"),
    (95, 95, "Thunderstorm", "wi-thunderstorm"),
    (96, 96, "Thunderstorm with hail", "wi-storm-showers"),
    (99, 99, "Thunderstorm with hail", "wi-storm-showers"),
];

/// Description and icon for a WMO weather code. Never fails.
pub fn decode(code: i32) -> Condition {
    WMO_TABLE
        .iter()
        .find(|(lo, hi, _, _)| (*lo..=*hi).contains(&code))
        .map(|&(_, _, description, icon)| Condition { description, icon })
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(decode(0).description, "Clear sky");
        assert_eq!(decode(0).icon, "wi-day-sunny");
        assert_eq!(decode(48).icon, "wi-fog");
        assert_eq!(decode(52).description, "Light drizzle");
        assert_eq!(decode(65).icon, "wi-rain-wind");
        assert_eq!(decode(75).icon, "wi-snow-wind");
        assert_eq!(decode(81).description, "Rain showers");
        assert_eq!(decode(95).icon, "wi-thunderstorm");
        assert_eq!(decode(99).icon, "wi-storm-showers");
    }

    #[test]
    fn test_unknown_codes_never_fail() {
        for code in [-1, 4, 44, 46, 54, 97, 100, i32::MAX, i32::MIN] {
            assert_eq!(decode(code), UNKNOWN, "code {}", code);
        }
    }
}
