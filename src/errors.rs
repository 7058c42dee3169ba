use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error class: "not_found", "bad_request", "unavailable" or "upstream"
    pub kind: String,
}

/// Failure of a single upstream HTTP call, tagged with the phase that failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout. Retried once by the gateway.
    #[error("request failed: {0}")]
    Network(String),

    /// Non-2xx status. `body` holds at most the first 512 bytes of the response.
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body is not the expected JSON.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Pipeline-level failure classes, matched exhaustively by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Upstream,
    Network,
    Decode,
    Validation,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("place {0:?} not found")]
    NotFound(String),

    #[error("no place name found for coordinates {lat:.4},{lon:.4}")]
    NoMatch { lat: f64, lon: f64 },

    #[error("{service}: {source}")]
    Fetch {
        service: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("{0}")]
    Validation(String),

    #[error("request deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
}

impl WeatherError {
    pub fn fetch(service: &'static str, source: FetchError) -> Self {
        WeatherError::Fetch { service, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::NotFound(_) | WeatherError::NoMatch { .. } => ErrorKind::NotFound,
            WeatherError::Fetch { source, .. } => match source {
                FetchError::Network(_) => ErrorKind::Network,
                FetchError::Status { .. } => ErrorKind::Upstream,
                FetchError::Decode(_) => ErrorKind::Decode,
            },
            WeatherError::Validation(_) => ErrorKind::Validation,
            WeatherError::DeadlineExceeded(_) => ErrorKind::Network,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

/// Shown for transient failures; the raw error is logged instead.
const UNREACHABLE_MESSAGE: &str =
    "Could not reach the weather service. Please check your connection and try again.";

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            ErrorKind::Validation => AppError::BadRequest(err.to_string()),
            ErrorKind::Network => {
                tracing::warn!("Upstream unreachable: {}", err);
                AppError::ServiceUnavailable(UNREACHABLE_MESSAGE.to_string())
            }
            ErrorKind::Upstream | ErrorKind::Decode => {
                AppError::ExternalServiceError(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg)
            }
            AppError::ExternalServiceError(msg) => (StatusCode::BAD_GATEWAY, "upstream", msg),
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: message,
                kind: kind.to_string(),
            }),
        )
            .into_response()
    }
}
