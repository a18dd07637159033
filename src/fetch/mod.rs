//! Rate-limited HTTP fetching.
//!
//! Every upstream call goes through one [`RateLimitedClient`]. Calls are
//! serialized: a 429 response is retried after the server-specified delay and
//! every successful response is followed by a fixed cooldown, so the shared
//! rate limit holds no matter how many tasks share the client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub mod riot;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid credential header: {0}")]
    InvalidHeader(String),

    #[error("Rate limited by {url} without a usable retry-after header")]
    RateLimitHeaderMissing { url: String },

    #[error("Still rate limited by {url} after {attempts} attempts")]
    RateLimitExhausted { url: String, attempts: u32 },

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamError { status: u16, url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status of an upstream rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A response as seen by the client: status, the raw `retry-after` header and
/// the body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<HttpResponse, FetchError>;
}

/// Production transport on `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("top4-stats/0.1.0")),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .headers(headers.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Configuration for the rate-limited client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Header carrying the API credential.
    pub api_key_header: String,

    pub api_key: String,

    /// Pause after every successful request.
    pub cooldown: Duration,

    /// Rate-limit retries before giving up; `None` retries forever.
    pub max_rate_limit_retries: Option<u32>,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key_header: "X-Riot-Token".to_string(),
            api_key: String::new(),
            cooldown: Duration::from_millis(500),
            max_rate_limit_retries: Some(10),
            timeout: Duration::from_secs(30),
            user_agent: "top4-stats/0.1.0".to_string(),
        }
    }
}

/// HTTP client honouring upstream rate limits.
pub struct RateLimitedClient {
    transport: Arc<dyn HttpTransport>,
    headers: HeaderMap,
    config: ClientConfig,
    gate: Mutex<()>,
}

impl RateLimitedClient {
    /// Create a client on the production transport.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(config.timeout, &config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, FetchError> {
        let name = reqwest::header::HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| FetchError::InvalidHeader(e.to_string()))?;
        let value = HeaderValue::from_str(&config.api_key)
            .map_err(|e| FetchError::InvalidHeader(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(name, value);

        Ok(Self {
            transport,
            headers,
            config,
            gate: Mutex::new(()),
        })
    }

    /// Fetch a URL string and decode its JSON body.
    pub async fn fetch_str<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.fetch(&url).await
    }

    /// Fetch a URL and decode its JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let body = self.fetch_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch a URL, retrying on 429 and cooling down after success.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let _turn = self.gate.lock().await;
        let mut rate_limited = 0u32;

        loop {
            info!("Fetching {}", url);
            let response = self.transport.get(url, &self.headers).await?;

            if response.status == 429 {
                let Some(wait) = response.retry_after.as_deref().and_then(parse_retry_after)
                else {
                    warn!("429 from {} without retry-after", url);
                    return Err(FetchError::RateLimitHeaderMissing {
                        url: url.to_string(),
                    });
                };

                rate_limited += 1;
                if let Some(max) = self.config.max_rate_limit_retries {
                    if rate_limited > max {
                        return Err(FetchError::RateLimitExhausted {
                            url: url.to_string(),
                            attempts: rate_limited,
                        });
                    }
                }

                warn!(
                    "Rate limited by {} (retry {}), waiting {:?}",
                    url, rate_limited, wait
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !response.is_success() {
                warn!("HTTP {} from {}", response.status, url);
                return Err(FetchError::UpstreamError {
                    status: response.status,
                    url: url.to_string(),
                });
            }

            debug!(
                "Cooling down {:?} after a request to {}",
                self.config.cooldown, url
            );
            tokio::time::sleep(self.config.cooldown).await;

            return Ok(response.body);
        }
    }
}

/// `retry-after` in seconds. Fractional values are accepted; negative,
/// non-finite or out-of-range values are treated as absent.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Transport replaying canned responses, for tests.
#[cfg(test)]
pub struct ScriptedTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<HttpResponse>>,
    requests: std::sync::Mutex<Vec<(String, HeaderMap)>>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: impl Into<String>) -> HttpResponse {
        HttpResponse {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            retry_after: None,
            body: String::new(),
        }
    }

    pub fn rate_limited(retry_after: &str) -> HttpResponse {
        HttpResponse {
            status: 429,
            retry_after: Some(retry_after.to_string()),
            body: String::new(),
        }
    }

    /// URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn requested_headers(&self) -> Vec<HeaderMap> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, headers)| headers.clone())
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<HttpResponse, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedTransport::status(404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn test_config() -> ClientConfig {
        ClientConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        }
    }

    fn client(transport: &Arc<ScriptedTransport>, config: ClientConfig) -> RateLimitedClient {
        RateLimitedClient::with_transport(config, transport.clone()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_json_after_cooldown() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::ok(
            r#"{"ok": true}"#,
        )]));
        let client = client(&transport, test_config());

        let start = Instant::now();
        let value: serde_json::Value = client
            .fetch_str("https://na1.api.riotgames.com/tft/league/v1/challenger")
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        assert!(start.elapsed() >= Duration::from_millis(500));
        let headers = transport.requested_headers();
        assert_eq!(headers[0].get("X-Riot-Token").unwrap(), "test-key");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_then_success() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::rate_limited("2"),
            ScriptedTransport::ok(r#"{"payload": 7}"#),
        ]));
        let client = client(
            &transport,
            ClientConfig {
                cooldown: Duration::ZERO,
                ..test_config()
            },
        );

        let url = "https://americas.api.riotgames.com/tft/match/v1/matches/NA1_1";
        let start = Instant::now();
        let value: serde_json::Value = client.fetch_str(url).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(value["payload"], 7);
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
        assert_eq!(transport.requested_urls(), vec![url, url]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_retry_after_fails() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse {
            status: 429,
            retry_after: None,
            body: String::new(),
        }]));
        let client = client(&transport, test_config());

        let result = client
            .fetch_str::<serde_json::Value>("https://kr.api.riotgames.com/x")
            .await;
        assert!(matches!(result, Err(FetchError::RateLimitHeaderMissing { .. })));
        assert_eq!(transport.requested_urls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_retry_after_fails() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::rate_limited("1e300"),
            ScriptedTransport::ok("1"),
        ]));
        let client = client(&transport, test_config());

        let result = client.fetch_str::<u32>("https://kr.api.riotgames.com/x").await;
        assert!(matches!(result, Err(FetchError::RateLimitHeaderMissing { .. })));
        assert_eq!(transport.requested_urls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::status(503)]));
        let client = client(&transport, test_config());

        let err = client
            .fetch_str::<serde_json::Value>("https://kr.api.riotgames.com/x")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(transport.requested_urls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_are_bounded() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::rate_limited("1"),
            ScriptedTransport::rate_limited("1"),
            ScriptedTransport::rate_limited("1"),
        ]));
        let client = client(
            &transport,
            ClientConfig {
                max_rate_limit_retries: Some(2),
                ..test_config()
            },
        );

        let result = client
            .fetch_str::<serde_json::Value>("https://kr.api.riotgames.com/x")
            .await;
        assert!(matches!(
            result,
            Err(FetchError::RateLimitExhausted { attempts: 3, .. })
        ));
        assert_eq!(transport.requested_urls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_retries() {
        let mut responses: Vec<HttpResponse> =
            (0..25).map(|_| ScriptedTransport::rate_limited("1")).collect();
        responses.push(ScriptedTransport::ok("[]"));
        let transport = Arc::new(ScriptedTransport::new(responses));
        let client = client(
            &transport,
            ClientConfig {
                max_rate_limit_retries: None,
                ..test_config()
            },
        );

        let value: Vec<String> = client
            .fetch_str("https://kr.api.riotgames.com/x")
            .await
            .unwrap();
        assert!(value.is_empty());
        assert_eq!(transport.requested_urls().len(), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_are_serialized() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::ok("1"),
            ScriptedTransport::ok("2"),
        ]));
        let client = Arc::new(client(&transport, test_config()));

        let start = Instant::now();
        let (a, b) = tokio::join!(
            client.fetch_str::<u32>("https://kr.api.riotgames.com/a"),
            client.fetch_str::<u32>("https://kr.api.riotgames.com/b"),
        );

        assert_eq!(a.unwrap() + b.unwrap(), 3);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let client = client(&transport, test_config());

        let result = client.fetch_str::<serde_json::Value>("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 0.5 "), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("1e300"), None);
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.api_key_header, "X-Riot-Token");
        assert_eq!(config.cooldown, Duration::from_millis(500));
        assert_eq!(config.max_rate_limit_retries, Some(10));
    }
}
