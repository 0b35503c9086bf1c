//! Document fetching from the remote archive.
//!
//! The [`DocumentFetcher`] trait is the transport seam: the orchestrator
//! and frontier only ever ask for "the bytes of this page". Retry,
//! timeouts, and rate limiting live behind it.

use async_trait::async_trait;
use bytes::Bytes;

pub mod http;
pub mod rate_limit;

pub use http::HttpFetcher;
pub use rate_limit::{RateLimitError, RateLimiter};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Network-level failure (timeout, connection refused, DNS)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    StatusError {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Rate limit exceeded (429)
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Response body could not be read
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Fetches raw documents from the archive by identifier.
///
/// Implementations must tolerate concurrent callers; the worker pool
/// issues up to the configured concurrency in fetches at once.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the page for one game.
    async fn fetch_game(&self, game_id: u32) -> FetcherResult<Bytes>;

    /// Fetch the listing page for one season.
    async fn fetch_season(&self, season_id: &str) -> FetcherResult<Bytes>;

    /// Fetch the index page enumerating all seasons.
    async fn fetch_season_index(&self) -> FetcherResult<Bytes>;
}
