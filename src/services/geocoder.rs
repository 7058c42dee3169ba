//! Place search and reverse lookup.
//!
//! Forward lookups go through the shared gateway. Reverse lookups call the
//! reverse-geocoding service directly because its usage policy requires an
//! identifying `User-Agent`.

use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;

use crate::errors::{FetchError, WeatherError};
use crate::models::Location;
use crate::services::gateway::{decode_json, Gateway};

const GEOCODE_SERVICE: &str = "geocode";
const REVERSE_SERVICE: &str = "reverse geocode";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Location>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
}

/// Place-name search and coordinate-to-name lookup.
#[derive(Debug, Clone)]
pub struct Geocoder {
    gateway: Gateway,
    search_url: Url,
    reverse_url: Url,
    user_agent: String,
}

impl Geocoder {
    /// `user_agent` is sent on reverse lookups, which require an identifying client.
    pub fn new(gateway: Gateway, search_url: Url, reverse_url: Url, user_agent: String) -> Self {
        Self {
            gateway,
            search_url,
            reverse_url,
            user_agent,
        }
    }

    /// Resolve a place name to its top-ranked match.
    pub async fn geocode(&self, place: &str) -> Result<Location, WeatherError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("name", place)
            .append_pair("count", "1")
            .append_pair("language", "en")
            .append_pair("format", "json");

        let response: SearchResponse = self
            .gateway
            .fetch_json(&url)
            .await
            .map_err(|e| WeatherError::fetch(GEOCODE_SERVICE, e))?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(place.to_string()))
    }

    /// Most specific place name for a coordinate pair.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, WeatherError> {
        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &format!("{:.6}", lat))
            .append_pair("lon", &format!("{:.6}", lon))
            .append_pair("format", "json")
            .append_pair("zoom", "10")
            .append_pair("addressdetails", "1");

        let response = self
            .gateway
            .client()
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT_LANGUAGE, "en")
            .timeout(self.gateway.timeout())
            .send()
            .await
            .map_err(|e| WeatherError::fetch(REVERSE_SERVICE, FetchError::Network(e.to_string())))?;

        let body: ReverseResponse = decode_json(response)
            .await
            .map_err(|e| WeatherError::fetch(REVERSE_SERVICE, e))?;

        pick_place_name(body).ok_or(WeatherError::NoMatch { lat, lon })
    }
}

/// city → town → village → municipality → county → first segment of display_name.
fn pick_place_name(body: ReverseResponse) -> Option<String> {
    let ReverseAddress {
        city,
        town,
        village,
        municipality,
        county,
    } = body.address;

    [city, town, village, municipality, county]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .or_else(|| {
            body.display_name
                .as_deref()
                .and_then(|d| d.split(',').next())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}
