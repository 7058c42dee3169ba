//! Upstream HTTP gateway.
//!
//! GET + JSON decode with exactly one retry on network-level failure, which
//! covers connection errors and bodies cut off mid-read. A non-2xx status or an
//! undecodable body is terminal for the call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::errors::FetchError;
use crate::services::dns::FallbackResolver;

/// Total attempts per call (initial + one retry).
const MAX_ATTEMPTS: u32 = 2;

/// Bytes of a non-2xx response body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

/// Gateway construction parameters.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub timeout: Duration,
    pub retry_backoff: Duration,
    pub dns_servers: Vec<std::net::IpAddr>,
}

/// Shared HTTP client for every upstream service.
///
/// Cloning is cheap; clones share the connection pool and DNS policy.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    timeout: Duration,
    retry_backoff: Duration,
}

impl Gateway {
    /// Build the shared client with the DNS fallback policy installed.
    pub fn new(config: &GatewayConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .dns_resolver(Arc::new(FallbackResolver::new(&config.dns_servers)))
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Same client and DNS policy, different per-call timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            client: self.client.clone(),
            timeout,
            retry_backoff: self.retry_backoff,
        }
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Underlying client, for callers that need custom request headers.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// A network failure while sending or while reading the body is retried
    /// once after the backoff.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self
                .client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(response) => decode_json(response).await,
                Err(e) => Err(FetchError::Network(e.to_string())),
            };

            match result {
                Err(FetchError::Network(e)) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}), retrying in {:?}: {}",
                        url.host_str().unwrap_or("?"),
                        attempt,
                        MAX_ATTEMPTS,
                        self.retry_backoff,
                        e
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                other => return other,
            }
        }
    }
}

/// Check the status and decode a response body.
///
/// A body that cannot be read (reset, timeout) is a `Network` failure; a body
/// that is not the expected JSON is a `Decode` failure.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = read_truncated(response, ERROR_BODY_LIMIT).await;
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(format!("failed to read body: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Read at most `limit` bytes of the body, stopping early on oversized pages.
async fn read_truncated(mut response: Response, limit: usize) -> String {
    let mut buf: Vec<u8> = Vec::with_capacity(limit);
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Gateway with a tiny backoff and OS-only DNS, for tests against a mock server.
    pub(crate) fn test_gateway() -> Gateway {
        Gateway::new(&GatewayConfig {
            timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(10),
            dns_servers: vec![],
        })
        .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: i32,
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/data", server.uri())).unwrap();
        let payload: Payload = test_gateway().fetch_json(&url).await.unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn test_status_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/data", server.uri())).unwrap();
        let err = test_gateway().fetch_json::<Payload>(&url).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 503,
                body: "maintenance".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_decode_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/data", server.uri())).unwrap();
        let err = test_gateway().fetch_json::<Payload>(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5000)))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/big", server.uri())).unwrap();
        match test_gateway().fetch_json::<Payload>(&url).await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), ERROR_BODY_LIMIT);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error_after_retry() {
        // Bind then drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/data", port)).unwrap();

        let started = std::time::Instant::now();
        let err = test_gateway().fetch_json::<Payload>(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
        // The single retry waits for the backoff before the second attempt.
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_with_timeout_keeps_client() {
        let gateway = test_gateway();
        let short = gateway.with_timeout(Duration::from_secs(6));
        assert_eq!(short.timeout(), Duration::from_secs(6));
        assert_eq!(gateway.timeout(), Duration::from_secs(5));
    }

    const OK_RESPONSE: &str =
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 11\r\n\r\n{\"value\":3}";
    const TRUNCATED_RESPONSE: &str =
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"val";

    /// Raw TCP server counting connections. `reply(n)` picks what the n-th
    /// connection gets: `None` closes it after reading the request, `Some`
    /// writes the bytes and then holds the socket open.
    async fn raw_server<F>(reply: F) -> (Url, Arc<AtomicUsize>)
    where
        F: Fn(usize) -> Option<&'static str> + Send + Sync + 'static,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        let reply = Arc::new(reply);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let reply = Arc::clone(&reply);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    if let Some(bytes) = reply(n) {
                        let _ = socket.write_all(bytes.as_bytes()).await;
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                });
            }
        });

        let url = Url::parse(&format!("http://{}/data", addr)).unwrap();
        (url, connections)
    }

    fn short_timeout_gateway() -> Gateway {
        Gateway::new(&GatewayConfig {
            timeout: Duration::from_millis(300),
            retry_backoff: Duration::from_millis(10),
            dns_servers: vec![],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_network_failure_is_retried_exactly_once() {
        let (url, connections) = raw_server(|_| None).await;

        let err = test_gateway().fetch_json::<Payload>(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_dropped_connection() {
        let (url, connections) = raw_server(|n| (n > 0).then_some(OK_RESPONSE)).await;

        let payload: Payload = test_gateway().fetch_json(&url).await.unwrap();
        assert_eq!(payload.value, 3);
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stalled_body_is_network_error() {
        let (url, connections) = raw_server(|_| Some(TRUNCATED_RESPONSE)).await;

        let err = short_timeout_gateway()
            .fetch_json::<Payload>(&url)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }
}
