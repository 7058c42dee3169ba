//! Unit normalisation for threshold comparisons.
//!
//! Display values in a report are never converted; these helpers only bring a
//! value onto the canonical scale (°C, km/h) before it is compared against a
//! fixed threshold.

const KMH_PER_MPH: f64 = 1.60934;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Celsius equivalent of `temp` given its unit symbol. Unknown symbols pass through.
pub fn to_celsius(temp: f64, unit_symbol: &str) -> f64 {
    match unit_symbol {
        "°F" => (temp - 32.0) * 5.0 / 9.0,
        _ => temp,
    }
}

/// km/h equivalent of `speed` given its unit label. Unknown labels pass through.
pub fn to_kmh(speed: f64, unit_label: &str) -> f64 {
    match unit_label {
        "mph" => speed * KMH_PER_MPH,
        _ => speed,
    }
}

/// Inverse of [`to_kmh`], truncated to whole units and suffixed with the label.
pub fn format_wind(kmh: f64, unit_label: &str) -> String {
    match unit_label {
        "mph" => format!("{} mph", (kmh / KMH_PER_MPH) as i32),
        _ => format!("{} km/h", kmh as i32),
    }
}

/// 8-point compass label for a wind direction in degrees.
pub fn wind_compass(degrees: i32) -> &'static str {
    let index = ((f64::from(degrees) + 22.5) / 45.0) as i32;
    COMPASS_POINTS[index.rem_euclid(8) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_celsius() {
        assert_eq!(to_celsius(32.0, "°F"), 0.0);
        assert_eq!(to_celsius(212.0, "°F"), 100.0);
        assert_eq!(to_celsius(21.5, "°C"), 21.5);
        assert_eq!(to_celsius(300.0, "K"), 300.0);
    }

    #[test]
    fn test_to_kmh() {
        assert!((to_kmh(10.0, "mph") - 16.0934).abs() < 1e-9);
        assert_eq!(to_kmh(10.0, "km/h"), 10.0);
        assert_eq!(to_kmh(10.0, "kmh"), 10.0);
        assert_eq!(to_kmh(10.0, "kn"), 10.0);
    }

    #[test]
    fn test_format_wind_converts_back() {
        assert_eq!(format_wind(35.4, "km/h"), "35 km/h");
        assert_eq!(format_wind(32.1868, "mph"), "20 mph");
    }

    #[test]
    fn test_wind_compass() {
        assert_eq!(wind_compass(0), "N");
        assert_eq!(wind_compass(22), "N");
        assert_eq!(wind_compass(23), "NE");
        assert_eq!(wind_compass(90), "E");
        assert_eq!(wind_compass(180), "S");
        assert_eq!(wind_compass(270), "W");
        assert_eq!(wind_compass(337), "NW");
        assert_eq!(wind_compass(338), "N");
        assert_eq!(wind_compass(360), "N");
    }
}
