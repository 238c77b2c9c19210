pub mod http;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Headers;

pub use http::HttpFetcher;

/// Result of a single GET: body, final status code, response headers.
///
/// HTTP error statuses (4xx/5xx) are carried here as ordinary results; only
/// transport-level failures surface as errors from [`Fetcher::get`].
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: String,
    pub status_code: u16,
    pub headers: Headers,
}

/// Trait for page fetching implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResult>;
}
