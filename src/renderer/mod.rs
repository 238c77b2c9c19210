pub mod chrome;

use async_trait::async_trait;

pub use chrome::ChromeRenderer;

/// Errors from a single render job.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The deadline passed. Carries whatever HTML was captured by then,
    /// possibly empty; the caller persists it and stops retrying.
    #[error("render deadline exceeded")]
    DeadlineExceeded { html: String },

    /// Any other failure; the job stays eligible for a future run.
    #[error("render failed: {0}")]
    Failed(String),
}

/// Trait for headless render implementations.
///
/// One implementation instance owns one browser process; each call opens its
/// own isolated tab.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate to `url`, wait for the document to be ready, and return the
    /// fully rendered HTML.
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}
