pub mod cache;
pub mod health;
pub mod reverse;
pub mod weather;

use axum::routing::get;
use axum::Router;

use crate::config::AppConfig;
use crate::errors::FetchError;
use crate::services::cache::ReportCache;
use crate::services::consensus::ConsensusEngine;
use crate::services::forecast::ForecastService;
use crate::services::gateway::{Gateway, GatewayConfig};
use crate::services::geocoder::Geocoder;

/// Shared state for every API handler.
#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub(crate) forecast: ForecastService,
    pub(crate) geocoder: Geocoder,
    pub(crate) cache: ReportCache,
}

impl AppState {
    /// Wire the pipeline from configuration. One HTTP client backs every service.
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let gateway = Gateway::new(&GatewayConfig {
            timeout: config.request_timeout,
            retry_backoff: config.retry_backoff,
            dns_servers: config.dns_servers.clone(),
        })?;

        let geocoder = Geocoder::new(
            gateway.clone(),
            config.geocoding_url.clone(),
            config.reverse_url.clone(),
            config.user_agent.clone(),
        );
        let consensus = ConsensusEngine::new(
            gateway.with_timeout(config.consensus_timeout),
            config.forecast_url.clone(),
        );
        let forecast = ForecastService::new(
            gateway,
            geocoder.clone(),
            consensus,
            config.forecast_url.clone(),
            config.max_place_len,
            config.request_deadline,
        );
        let cache = ReportCache::new(
            config.cache_ttl,
            config.cache_capacity,
            config.cache_sweep_interval,
        );

        Ok(Self {
            forecast,
            geocoder,
            cache,
        })
    }
}

/// All `/api/v1` routes.
pub(crate) fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/weather", get(weather::get_weather))
        .route("/api/v1/reverse", get(reverse::reverse_geocode))
        .route("/api/v1/cache/status", get(cache::get_cache_status))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use reqwest::Url;
    use tower::ServiceExt;

    /// Configuration pointing every upstream at `base` (a mock server).
    pub(crate) fn test_config(base: &str) -> AppConfig {
        AppConfig {
            port: 0,
            geocoding_url: Url::parse(&format!("{}/v1/search", base)).unwrap(),
            forecast_url: Url::parse(&format!("{}/v1/forecast", base)).unwrap(),
            reverse_url: Url::parse(&format!("{}/reverse", base)).unwrap(),
            user_agent: "TestAgent/1.0".to_string(),
            dns_servers: vec![],
            request_timeout: Duration::from_secs(5),
            consensus_timeout: Duration::from_secs(2),
            retry_backoff: Duration::from_millis(10),
            request_deadline: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(600),
            cache_capacity: 200,
            cache_sweep_interval: Duration::from_secs(300),
            max_place_len: 100,
        }
    }

    pub(crate) fn test_state(base: &str) -> AppState {
        AppState::from_config(&test_config(base)).unwrap()
    }

    pub(crate) async fn send(state: AppState, uri: &str) -> Response<Body> {
        api_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = send(test_state("http://127.0.0.1:9"), "/api/v1/nope").await;
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
