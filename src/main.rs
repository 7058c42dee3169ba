// Weather Consensus API v0.1
use std::net::SocketAddr;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;

/// OpenAPI document for the Weather Consensus API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Consensus API",
        version = "0.1.0",
        description = "Resolves a place name to current conditions, an hourly and 5-day \
            forecast, sun and moon state, and a cross-model consensus. Reports are cached \
            per place and unit system for a short window.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Aggregated weather reports"),
        (name = "Geocoding", description = "Coordinate to place-name lookup"),
        (name = "Cache", description = "Report cache status"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_weather,
        routes::reverse::reverse_geocode,
        routes::cache::get_cache_status,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::WeatherResponse,
            routes::reverse::ReverseResponse,
            models::Report,
            models::Location,
            models::UnitSystem,
            models::CurrentConditions,
            models::DailyForecastEntry,
            models::HourlyPoint,
            models::SunPosition,
            models::ModelReading,
            models::Agreement,
            models::ConsensusSummary,
            services::outfit::OutfitAdvice,
            services::outfit::OutfitItem,
            services::outfit::TempTier,
            services::uv::UvLevel,
            services::alerts::Alert,
            services::alerts::AlertLevel,
            services::cache::CacheStatus,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_consensus_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "Upstreams: geocoding={} forecast={} reverse={}; DNS servers: {:?}",
        config.geocoding_url,
        config.forecast_url,
        config.reverse_url,
        config.dns_servers
    );

    let app_state = AppState::from_config(&config).expect("Failed to build HTTP client");

    // Cache sweeper lives until shutdown
    let shutdown = CancellationToken::new();
    let sweeper = app_state.cache.spawn_sweeper(shutdown.clone());

    // Read-only API: GET only, X-Cache exposed to browsers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(
            routes::weather::X_CACHE,
        )]);

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server terminated unexpectedly");

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::error!("Cache sweeper task failed: {}", e);
    }
    tracing::info!("Server shutdown complete");
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
