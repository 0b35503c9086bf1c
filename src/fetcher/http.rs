//! HTTP fetcher for the archive with retry and rate limiting.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::harvester::config::{calculate_backoff, DEFAULT_MAX_RETRIES};
use crate::metrics;

use super::rate_limit::RateLimiter;
use super::{DocumentFetcher, FetcherError, FetcherResult};

/// Default archive base URL.
pub const DEFAULT_BASE_URL: &str = "https://j-archive.com";

/// Per-request timeout. The archive occasionally stalls on large game
/// pages; 30 seconds covers the slow tail without hanging a worker.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default request budget per rolling window.
const DEFAULT_REQUESTS_PER_WINDOW: usize = 4;
const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

/// Archive HTTP fetcher.
///
/// Retries network errors, 429s, and 5xx responses with exponential
/// backoff. Other 4xx responses fail immediately; a missing game page is
/// not going to appear on retry.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    max_retries: u32,
}

impl HttpFetcher {
    /// Create a fetcher against the default archive URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a fetcher against a custom base URL (used by tests and
    /// mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("jarchive-harvester/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
            rate_limiter: Arc::new(RateLimiter::new(
                DEFAULT_REQUESTS_PER_WINDOW,
                DEFAULT_RATE_WINDOW,
            )),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the rate limiter.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Base URL this fetcher targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_bytes(&self, url: &str) -> FetcherResult<Bytes> {
        self.rate_limiter
            .acquire()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Rate limiter error: {e}")))?;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            metrics::record_http_request();

            let response = match self.client.get(url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        error = %e,
                        "Network error, will retry"
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));
                    if attempt < self.max_retries {
                        tokio::time::sleep(calculate_backoff(attempt)).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                metrics::record_http_throttled();
                warn!(url, attempt = attempt + 1, "Archive throttled the request (429)");
                last_error = Some(FetcherError::RateLimitExceeded);
                if attempt < self.max_retries {
                    tokio::time::sleep(calculate_backoff(attempt + 1)).await;
                    continue;
                }
                break;
            }

            if status.is_server_error() {
                warn!(url, status = status.as_u16(), "Server error, will retry");
                last_error = Some(FetcherError::StatusError {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
                if attempt < self.max_retries {
                    tokio::time::sleep(calculate_backoff(attempt)).await;
                    continue;
                }
                break;
            }

            if !status.is_success() {
                // Client errors other than 429 are not retryable
                return Err(FetcherError::StatusError {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetcherError::InvalidResponse(e.to_string()))?;
            debug!(url, bytes = bytes.len(), "Fetched document");
            return Ok(bytes);
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("exhausted retries".to_string())))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_game(&self, game_id: u32) -> FetcherResult<Bytes> {
        let url = format!("{}/showgame.php?game_id={game_id}", self.base_url);
        self.get_bytes(&url).await
    }

    async fn fetch_season(&self, season_id: &str) -> FetcherResult<Bytes> {
        let url = format!("{}/showseason.php?season={season_id}", self.base_url);
        self.get_bytes(&url).await
    }

    async fn fetch_season_index(&self) -> FetcherResult<Bytes> {
        let url = format!("{}/listseasons.php", self.base_url);
        self.get_bytes(&url).await
    }
}
