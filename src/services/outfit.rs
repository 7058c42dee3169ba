//! Outfit recommendation from current conditions.
//!
//! Thresholds are on the canonical scale: feels-like °C, wind km/h.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Report;
use crate::services::units::{format_wind, to_celsius, to_kmh};

const MAX_ITEMS: usize = 6;

/// Temperature band derived from the feels-like value in °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TempTier {
    Freezing,
    Cold,
    Cool,
    #[default]
    Mild,
    Warm,
    Hot,
}

impl TempTier {
    /// Tier for a feels-like temperature in °C.
    pub fn from_feels_like_c(feels_c: f64) -> Self {
        match feels_c {
            t if t < 0.0 => TempTier::Freezing,
            t if t < 8.0 => TempTier::Cold,
            t if t < 15.0 => TempTier::Cool,
            t if t < 22.0 => TempTier::Mild,
            t if t < 29.0 => TempTier::Warm,
            _ => TempTier::Hot,
        }
    }

    fn headline(self) -> &'static str {
        match self {
            TempTier::Freezing => "Bundle up, it's freezing out there",
            TempTier::Cold => "Dress warm, it's a cold one",
            TempTier::Cool => "A jacket will do nicely today",
            TempTier::Mild => "Perfect weather, dress easy",
            TempTier::Warm => "Light layers, you'll be comfortable",
            TempTier::Hot => "Stay cool, it's scorching",
        }
    }
}

/// A single clothing or accessory suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OutfitItem {
    /// Icon key (e.g. "umbrella")
    pub icon: String,
    pub label: String,
    pub note: String,
    /// CSS accent class
    pub color: String,
}

impl OutfitItem {
    fn new(icon: &str, label: &str, color: &str, note: impl Into<String>) -> Self {
        Self {
            icon: icon.to_string(),
            label: label.to_string(),
            note: note.into(),
            color: color.to_string(),
        }
    }
}

/// Outfit suggestion attached to every report.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct OutfitAdvice {
    pub headline: String,
    /// At most 6 items
    pub items: Vec<OutfitItem>,
    pub temp_tier: TempTier,
}

/// Build the outfit suggestion for a report (at most 6 items).
pub fn build_outfit(report: &Report) -> OutfitAdvice {
    let current = &report.current;
    let feels_c = to_celsius(
        current.feels_like.unwrap_or(current.temperature),
        &report.temp_unit,
    );
    let wind_kmh = to_kmh(current.wind_speed.unwrap_or(0.0), &report.wind_unit);
    let precip = report
        .daily
        .first()
        .and_then(|d| d.precipitation_probability)
        .unwrap_or(0);
    let uv = current.uv_index.unwrap_or(0.0);

    let tier = TempTier::from_feels_like_c(feels_c);
    let mut items = Vec::new();

    items.push(match tier {
        TempTier::Freezing => OutfitItem::new(
            "thermal",
            "Thermal Base",
            "oi-blue",
            "Moisture-wicking thermals keep heat in",
        ),
        TempTier::Cold => OutfitItem::new(
            "sweater",
            "Thick Sweater",
            "oi-blue",
            "Wool or fleece sweater recommended",
        ),
        TempTier::Cool => OutfitItem::new(
            "longsleeve",
            "Long Sleeve",
            "oi-sky",
            "A long-sleeve shirt is enough inside",
        ),
        TempTier::Mild => {
            OutfitItem::new("tshirt", "T-Shirt", "oi-green", "Any casual top works great")
        }
        TempTier::Warm | TempTier::Hot => OutfitItem::new(
            "tshirt",
            "Light Top",
            "oi-orange",
            "Breathable, light-coloured fabric is best",
        ),
    });

    match tier {
        TempTier::Freezing => items.push(OutfitItem::new(
            "coat",
            "Heavy Coat",
            "oi-indigo",
            "Insulated or down-filled coat essential",
        )),
        TempTier::Cold => items.push(OutfitItem::new(
            "coat",
            "Winter Coat",
            "oi-indigo",
            "Lined coat with hood recommended",
        )),
        TempTier::Cool => items.push(OutfitItem::new(
            "jacket",
            "Light Jacket",
            "oi-sky",
            "Zip-up or denim jacket keeps the chill off",
        )),
        _ => {}
    }

    if wind_kmh >= 30.0 && !matches!(tier, TempTier::Freezing | TempTier::Cold) {
        items.push(OutfitItem::new(
            "windbreaker",
            "Windbreaker",
            "oi-teal",
            format!(
                "Gusts up to {}, block the wind",
                format_wind(wind_kmh, &report.wind_unit)
            ),
        ));
    }

    if precip >= 60 {
        items.push(OutfitItem::new(
            "umbrella",
            "Umbrella",
            "oi-blue",
            format!("Rain likely today ({}% chance)", precip),
        ));
    } else if precip >= 30 {
        items.push(OutfitItem::new(
            "raincoat",
            "Rain Jacket",
            "oi-sky",
            format!("Pack one just in case ({}% chance)", precip),
        ));
    }

    if uv >= 8.0 {
        items.push(OutfitItem::new(
            "sunscreen",
            "SPF 50+",
            "oi-orange",
            "UV is very high, reapply every 2 hours",
        ));
        items.push(OutfitItem::new(
            "sunglasses",
            "Sunglasses",
            "oi-amber",
            format!("Protect your eyes from UV {} index", uv as i32),
        ));
    } else if uv >= 5.0 {
        items.push(OutfitItem::new(
            "sunscreen",
            "Sunscreen",
            "oi-amber",
            format!("UV {}, SPF 30 before heading out", uv as i32),
        ));
    }

    if tier == TempTier::Freezing {
        items.push(OutfitItem::new(
            "beanie",
            "Beanie + Gloves",
            "oi-indigo",
            "Extremities lose heat fast in freezing temps",
        ));
    } else if uv >= 6.0 {
        items.push(OutfitItem::new(
            "hat",
            "Sun Hat",
            "oi-amber",
            "Wide brim hat shields face and neck",
        ));
    }

    if precip >= 50 || tier == TempTier::Freezing {
        items.push(OutfitItem::new(
            "boots",
            "Waterproof Boots",
            "oi-teal",
            "Keep feet dry on wet ground",
        ));
    } else if tier == TempTier::Hot {
        items.push(OutfitItem::new(
            "sandals",
            "Sandals",
            "oi-orange",
            "Let your feet breathe in the heat",
        ));
    }

    items.truncate(MAX_ITEMS);

    OutfitAdvice {
        headline: tier.headline().to_string(),
        items,
        temp_tier: tier,
    }
}
