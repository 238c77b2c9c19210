use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response headers as a multi-valued map, serialized to JSON in the store.
pub type Headers = BTreeMap<String, Vec<String>>;

/// One archived page, uniquely keyed by (cve_id, url).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedPage {
    pub cve_id: String,
    /// The URL actually stored; a live URL, or the resolved snapshot URL
    /// when the live fetch failed.
    pub url: String,
    /// Empty unless the stored HTML came from a Wayback snapshot.
    pub wayback_url: String,
    pub html: String,
    pub status_code: u16,
    pub headers: Headers,
    pub js_required: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl ArchivedPage {
    pub fn new(cve_id: String, url: String) -> Self {
        Self {
            cve_id,
            url,
            wayback_url: String::new(),
            html: String::new(),
            status_code: 0,
            headers: Headers::new(),
            js_required: false,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// A page still waiting for a headless render: `js_required` set,
/// `completed` not yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub id: i64,
    pub url: String,
}

/// Decides whether a fetched body needs a headless render pass to produce
/// its real content.
pub trait RenderClassifier: Send + Sync {
    fn requires_render(&self, body: &str) -> bool;
}

/// Default heuristic: an empty body, or any case variant of a `<noscript>`
/// tag, means the page depends on client-side script execution.
///
/// Pages that need JS without emitting a noscript tag are misclassified as
/// complete; that is a known limitation of the heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoscriptHeuristic;

impl RenderClassifier for NoscriptHeuristic {
    fn requires_render(&self, body: &str) -> bool {
        body.is_empty() || body.to_lowercase().contains("<noscript>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_requires_render() {
        assert!(NoscriptHeuristic.requires_render(""));
    }

    #[test]
    fn test_noscript_requires_render() {
        assert!(NoscriptHeuristic.requires_render("<html><noscript>enable js</noscript></html>"));
    }

    #[test]
    fn test_noscript_case_insensitive() {
        assert!(NoscriptHeuristic.requires_render("<HTML><NOSCRIPT></NOSCRIPT></HTML>"));
        assert!(NoscriptHeuristic.requires_render("<NoScript>"));
    }

    #[test]
    fn test_plain_body_complete() {
        assert!(!NoscriptHeuristic.requires_render("<html><body>content</body></html>"));
    }

    #[test]
    fn test_new_page_defaults() {
        let page = ArchivedPage::new("CVE-2024-0001".into(), "http://example.com".into());
        assert!(page.wayback_url.is_empty());
        assert!(page.html.is_empty());
        assert_eq!(page.status_code, 0);
        assert!(!page.js_required);
        assert!(!page.completed);
    }
}
