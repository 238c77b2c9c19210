//! Wayback Machine snapshot resolution.
//!
//! Queries the CDX index for the earliest archived capture of a URL with
//! status 200 and turns its timestamp into a replayable snapshot URL.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::{CveVaultError, Result};
use crate::config::{CrawlConfig, USER_AGENT};

const CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Trait for archive snapshot lookup implementations.
#[async_trait]
pub trait ArchiveResolver: Send + Sync {
    /// Resolve the closest archived snapshot URL for `url`.
    ///
    /// A missing snapshot is an expected outcome, reported as
    /// [`CveVaultError::SnapshotNotFound`].
    async fn resolve_snapshot(&self, url: &str) -> Result<String>;
}

pub struct WaybackResolver {
    client: Client,
}

impl WaybackResolver {
    pub fn new(config: &CrawlConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for WaybackResolver {
    fn default() -> Self {
        Self::new(&CrawlConfig::default())
    }
}

#[async_trait]
impl ArchiveResolver for WaybackResolver {
    async fn resolve_snapshot(&self, url: &str) -> Result<String> {
        let request_url = Url::parse_with_params(
            CDX_ENDPOINT,
            &[
                ("url", url),
                ("output", "json"),
                ("filter", "statuscode:200"),
                ("limit", "1"),
                ("sort", "timestamp"),
            ],
        )?;

        let body = self
            .client
            .get(request_url)
            .send()
            .await?
            .text()
            .await?;

        snapshot_from_cdx(url, &body)
    }
}

/// Parse a CDX JSON response into a snapshot URL.
///
/// The response is an array of string arrays: a header row followed by at
/// most one capture row of the form `[urlkey, timestamp, original, ...]`.
fn snapshot_from_cdx(url: &str, body: &str) -> Result<String> {
    let rows: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| CveVaultError::Wayback(format!("failed to decode CDX response: {e}")))?;

    match rows.get(1) {
        Some(row) if row.len() >= 3 => {
            let timestamp = &row[1];
            Ok(format!("https://web.archive.org/web/{timestamp}/{url}"))
        }
        _ => Err(CveVaultError::SnapshotNotFound(url.to_string())),
    }
}
