pub mod crawl;
pub mod render;

pub use crawl::fetch_and_store;
pub use render::render_required_pages;


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{element, run_crawl, MockFetcher, MockRenderer, MockResolver};
    use super::*;
    use crate::store::{SqliteStore, Store};

    /// Full pass: a dead live URL falls back to an empty archived snapshot,
    /// gets flagged for rendering, and a later render pass completes it.
    #[tokio::test]
    async fn test_end_to_end_fallback_then_render() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fetcher = MockFetcher::new().with_page("http://archive/snap", 200, "");
        let resolver = MockResolver::with_snapshot("http://good", "http://archive/snap");

        run_crawl(
            store.clone(),
            fetcher,
            resolver,
            vec![element("CVE-X", &["http://good"])],
        )
        .await;

        let page = store
            .get_page("CVE-X", "http://archive/snap")
            .unwrap()
            .unwrap();
        assert_eq!(page.url, "http://archive/snap");
        assert_eq!(page.wayback_url, "http://archive/snap");
        assert!(page.js_required);
        assert!(!page.completed);

        let renderer =
            MockRenderer::new().with_html("http://archive/snap", "<html>rendered</html>");
        render_required_pages(store.clone(), Arc::new(renderer), 2)
            .await
            .unwrap();

        let page = store
            .get_page("CVE-X", "http://archive/snap")
            .unwrap()
            .unwrap();
        assert_eq!(page.html, "<html>rendered</html>");
        assert!(page.completed);
    }

    /// Full pass: a healthy live page is archived complete in one run.
    #[tokio::test]
    async fn test_end_to_end_live_page() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fetcher = MockFetcher::new().with_page("http://good", 200, "<html>content</html>");

        run_crawl(
            store.clone(),
            fetcher,
            MockResolver::not_found(),
            vec![element("CVE-X", &["http://good"])],
        )
        .await;

        let page = store.get_page("CVE-X", "http://good").unwrap().unwrap();
        assert!(!page.js_required);
        assert!(page.completed);
        assert!(page.wayback_url.is_empty());
        assert!(store.find_pages_needing_render().unwrap().is_empty());
    }
}
