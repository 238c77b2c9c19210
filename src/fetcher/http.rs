use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::config::{CrawlConfig, USER_AGENT};
use crate::domain::Headers;
use crate::fetcher::{FetchResult, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(USER_AGENT)
            // Many CVE references point at hosts with broken or expired
            // certificates; archive anyway.
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&CrawlConfig::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResult> {
        let response = self.client.get(url).send().await?;

        let status_code = response.status().as_u16();

        let mut headers = Headers::new();
        for key in response.headers().keys() {
            let values = response
                .headers()
                .get_all(key)
                .iter()
                .filter_map(|v| v.to_str().ok().map(String::from))
                .collect();
            headers.insert(key.to_string(), values);
        }

        let body = response.text().await?;

        let sample: String = body.chars().take(20).collect();
        tracing::debug!(url, status_code, body_len = body.len(), %sample, "fetched");

        Ok(FetchResult {
            body,
            status_code,
            headers,
        })
    }
}
