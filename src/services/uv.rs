//! UV index banding and sun-protection advice.

use serde::Serialize;
use utoipa::ToSchema;

/// WHO UV exposure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    Extreme,
}

impl UvLevel {
    /// Category for a UV index value; bands are [0,3), [3,6), [6,8), [8,11), 11+.
    pub fn from_index(uv: f64) -> Self {
        match uv {
            v if v < 3.0 => UvLevel::Low,
            v if v < 6.0 => UvLevel::Moderate,
            v if v < 8.0 => UvLevel::High,
            v if v < 11.0 => UvLevel::VeryHigh,
            _ => UvLevel::Extreme,
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            UvLevel::Low => "No protection needed. Enjoy the sun safely.",
            UvLevel::Moderate => "Wear sunscreen SPF 30+. Hat recommended.",
            UvLevel::High => "SPF 50+ sunscreen, hat and sunglasses. Seek shade 11am to 3pm.",
            UvLevel::VeryHigh => "SPF 50+ and protective clothing essential. Minimize sun exposure.",
            UvLevel::Extreme => "Extreme UV. Stay indoors if possible. Full protection required.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_band_edges() {
        assert_eq!(UvLevel::from_index(0.0), UvLevel::Low);
        assert_eq!(UvLevel::from_index(2.99), UvLevel::Low);
        assert_eq!(UvLevel::from_index(3.0), UvLevel::Moderate);
        assert_eq!(UvLevel::from_index(6.0), UvLevel::High);
        assert_eq!(UvLevel::from_index(7.9), UvLevel::High);
        assert_eq!(UvLevel::from_index(8.0), UvLevel::VeryHigh);
        assert_eq!(UvLevel::from_index(11.0), UvLevel::Extreme);
    }

    #[test]
    fn test_serializes_display_label() {
        assert_eq!(
            serde_json::to_value(UvLevel::VeryHigh).unwrap(),
            serde_json::json!("Very High")
        );
        assert!(UvLevel::Low.advice().starts_with("No protection"));
    }
}
