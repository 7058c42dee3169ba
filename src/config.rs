use std::net::IpAddr;
use std::time::Duration;

use reqwest::Url;

const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_USER_AGENT: &str = "WeatherConsensus/0.1 (weather-consensus-api)";
const DEFAULT_DNS_SERVERS: &str = "8.8.8.8,1.1.1.1,8.8.4.4";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub geocoding_url: Url,
    pub forecast_url: Url,
    pub reverse_url: Url,
    /// Sent to the reverse-geocoding service, whose usage policy requires it.
    pub user_agent: String,
    /// Public resolvers tried before the OS resolver. Empty means OS only.
    pub dns_servers: Vec<IpAddr>,
    pub request_timeout: Duration,
    pub consensus_timeout: Duration,
    pub retry_backoff: Duration,
    /// Upper bound for one whole weather request, including every sub-fetch.
    pub request_deadline: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub cache_sweep_interval: Duration,
    /// Maximum place-name length in characters.
    pub max_place_len: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 8080),
            geocoding_url: env_url("GEOCODING_URL", DEFAULT_GEOCODING_URL),
            forecast_url: env_url("FORECAST_URL", DEFAULT_FORECAST_URL),
            reverse_url: env_url("REVERSE_GEOCODING_URL", DEFAULT_REVERSE_URL),
            user_agent: std::env::var("USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            dns_servers: parse_dns_servers(
                &std::env::var("DNS_SERVERS").unwrap_or_else(|_| DEFAULT_DNS_SERVERS.to_string()),
            ),
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 30)),
            consensus_timeout: Duration::from_secs(env_parse("CONSENSUS_TIMEOUT_SECS", 6)),
            retry_backoff: Duration::from_millis(env_parse("RETRY_BACKOFF_MS", 1000)),
            request_deadline: Duration::from_secs(env_parse("REQUEST_DEADLINE_SECS", 45)),
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", 600)),
            cache_capacity: env_parse("CACHE_CAPACITY", 200),
            cache_sweep_interval: Duration::from_secs(env_parse("CACHE_SWEEP_SECS", 300)),
            max_place_len: env_parse("MAX_PLACE_LEN", 100),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => default,
    }
}

fn env_url(name: &str, default: &str) -> Url {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).unwrap_or_else(|e| panic!("{} must be a valid URL ({}): {:?}", name, e, raw))
}

/// Parse a comma-separated resolver list, skipping entries that are not IP addresses.
fn parse_dns_servers(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!("Ignoring invalid DNS server address '{}'", s);
                None
            }
        })
        .collect()
}
