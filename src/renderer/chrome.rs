use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::app::{CveVaultError, Result};
use crate::config::{RendererConfig, USER_AGENT};
use crate::renderer::{RenderError, Renderer};

/// Grace period for grabbing whatever content exists after the render
/// deadline has already passed.
const PARTIAL_CAPTURE_TIMEOUT: Duration = Duration::from_secs(1);

/// Chrome-based renderer using chromiumoxide.
///
/// One browser process is shared by all render workers; every job opens its
/// own tab. The process is torn down when the renderer is dropped.
pub struct ChromeRenderer {
    browser: Browser,
    config: RendererConfig,
}

impl ChromeRenderer {
    pub async fn new(config: RendererConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-http2")
            .arg("--disable-popup-blocking")
            .arg("--disable-site-isolation-trials")
            .arg("--disable-blink-features=AutomationControlled");

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| CveVaultError::Renderer(format!("Failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            CveVaultError::Renderer(format!(
                "Failed to launch browser: {e}. Is Chrome or Chromium installed and in PATH?"
            ))
        })?;

        // Drive browser events until the browser goes away.
        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok(Self { browser, config })
    }

    pub async fn with_defaults() -> Result<Self> {
        Self::new(RendererConfig::default()).await
    }

    async fn navigate_and_capture(
        &self,
        page: &Page,
        url: &str,
    ) -> std::result::Result<String, RenderError> {
        page.set_user_agent(USER_AGENT)
            .await
            .map_err(|e| RenderError::Failed(format!("Failed to set user agent: {e}")))?;

        page.goto(url)
            .await
            .map_err(|e| RenderError::Failed(format!("Navigation failed: {e}")))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| RenderError::Failed(format!("Navigation failed: {e}")))?;

        // Let client-side frameworks finish mutating the DOM.
        tokio::time::sleep(self.config.settle()).await;

        page.content()
            .await
            .map_err(|e| RenderError::Failed(format!("Failed to extract HTML: {e}")))
    }

    /// Best-effort grab of whatever the page holds once the deadline has
    /// passed. Failure here just means an empty capture.
    async fn capture_partial(page: &Page) -> String {
        match tokio::time::timeout(PARTIAL_CAPTURE_TIMEOUT, page.content()).await {
            Ok(Ok(html)) => html,
            _ => String::new(),
        }
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> std::result::Result<String, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Failed(format!("Failed to open tab: {e}")))?;

        let outcome =
            tokio::time::timeout(self.config.timeout(), self.navigate_and_capture(&page, url))
                .await;

        let result = match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                let html = Self::capture_partial(&page).await;
                tracing::warn!(url, html_len = html.len(), "render deadline exceeded");
                Err(RenderError::DeadlineExceeded { html })
            }
        };

        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "failed to close tab");
        }

        result
    }
}
