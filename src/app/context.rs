use std::path::Path;
use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::domain::{NoscriptHeuristic, RenderClassifier};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::store::sqlite::SqliteStore;
use crate::wayback::{ArchiveResolver, WaybackResolver};

/// Wires the store, HTTP fetcher, wayback resolver, and classifier together.
/// The headless renderer is constructed separately, only when render work
/// actually exists.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub resolver: Arc<dyn ArchiveResolver>,
    pub classifier: Arc<dyn RenderClassifier>,
    pub config: Config,
}

impl AppContext {
    pub fn new<P: AsRef<Path>>(db_path: P, config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(db_path)?);
        Ok(Self::wire(store, config))
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self::wire(store, config))
    }

    fn wire(store: Arc<SqliteStore>, config: Config) -> Self {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawl));
        let resolver: Arc<dyn ArchiveResolver> = Arc::new(WaybackResolver::new(&config.crawl));
        let classifier: Arc<dyn RenderClassifier> = Arc::new(NoscriptHeuristic);

        Self {
            store,
            fetcher,
            resolver,
            classifier,
            config,
        }
    }
}
