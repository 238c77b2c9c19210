//! Configuration for the crawl and render stages.
//!
//! Everything has a usable default; a TOML file passed via `--config` can
//! override individual fields. Missing fields fall back to defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{CveVaultError, Result};

/// Fixed user agent shared by the HTTP client and the headless browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

pub const DEFAULT_WORKERS: usize = 10;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub renderer: RendererConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CveVaultError::Config(e.to_string()))?;
        Ok(config)
    }
}

/// Configuration for the fetch-dedup-store stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Number of concurrent workers draining the element queue (default: 10)
    pub workers: usize,

    /// Cap on concurrent URL fetches within a single element (default: 8)
    pub url_concurrency: usize,

    /// HTTP client timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            url_concurrency: 8,
            timeout_secs: 30,
        }
    }
}

impl CrawlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the headless render stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Per-page render deadline in seconds (default: 10)
    pub timeout_secs: u64,

    /// Wait after load for client-side frameworks to settle, in milliseconds
    /// (default: 3000)
    pub settle_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 10,
            settle_ms: 3000,
        }
    }
}

impl RendererConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
