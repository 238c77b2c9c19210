//! The fetch-dedup-store pipeline.
//!
//! Elements are dispatched through a bounded queue to a fixed pool of
//! workers. Each worker fans out one task per URL of its element (capped by
//! a shared semaphore), runs the dedup/fetch/fallback/classify sequence, and
//! persists the surviving results one by one.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::app::CveVaultError;
use crate::config::CrawlConfig;
use crate::dataset::Element;
use crate::domain::{ArchivedPage, RenderClassifier};
use crate::fetcher::Fetcher;
use crate::store::Store;
use crate::wayback::ArchiveResolver;

/// Everything a URL task needs, shared across the whole pipeline run.
struct CrawlCtx<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn ArchiveResolver>,
    classifier: Arc<dyn RenderClassifier>,
    /// Caps concurrent URL fetches across all elements.
    url_permits: Semaphore,
}

/// Drain `elements`, archiving every URL of every element.
///
/// Runs `config.workers` workers over a queue of the same capacity and
/// returns once the input closes and all in-flight work has finished.
/// Individual task failures are logged and dropped; they never abort the
/// pipeline.
pub async fn fetch_and_store<S>(
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn ArchiveResolver>,
    classifier: Arc<dyn RenderClassifier>,
    mut elements: mpsc::Receiver<Element>,
    config: &CrawlConfig,
) where
    S: Store + Send + Sync + 'static,
{
    let workers = config.workers.max(1);

    let ctx = Arc::new(CrawlCtx {
        store,
        fetcher,
        resolver,
        classifier,
        url_permits: Semaphore::new(config.url_concurrency.max(1)),
    });

    let (tx, rx) = mpsc::channel::<Element>(workers);
    let rx = Arc::new(Mutex::new(rx));

    let mut pool = JoinSet::new();
    for _ in 0..workers {
        let rx = rx.clone();
        let ctx = ctx.clone();

        pool.spawn(async move {
            loop {
                let element = rx.lock().await.recv().await;
                match element {
                    Some(element) => process_element(&ctx, element).await,
                    None => break,
                }
            }
        });
    }

    while let Some(element) = elements.recv().await {
        if tx.send(element).await.is_err() {
            break;
        }
    }
    drop(tx);

    while pool.join_next().await.is_some() {}
}

/// Fan out one task per URL, then persist the collected results on this
/// worker. A second writer racing on the same (cve_id, url) loses silently
/// inside `insert_if_absent`; that is the intended outcome.
async fn process_element<S>(ctx: &Arc<CrawlCtx<S>>, element: Element)
where
    S: Store + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();

    for url in element.urls {
        let ctx = ctx.clone();
        let cve_id = element.cve_id.clone();

        tasks.spawn(async move { archive_url(&ctx, &cve_id, url).await });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(page)) => {
                if let Err(e) = ctx.store.insert_if_absent(&page) {
                    tracing::error!(url = %page.url, error = %e, "failed to persist page");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "url task join error"),
        }
    }
}

/// The per-URL sequence: dedup check, live fetch, wayback fallback,
/// classification. Returns `None` when the URL is skipped or abandoned for
/// this run.
async fn archive_url<S>(ctx: &CrawlCtx<S>, cve_id: &str, url: String) -> Option<ArchivedPage>
where
    S: Store + Send + Sync,
{
    // Never closed, so acquire cannot fail.
    let _permit = ctx.url_permits.acquire().await.ok()?;

    match ctx.store.exists(cve_id, &url) {
        Ok(true) => {
            tracing::debug!(%url, "skipping, already archived");
            return None;
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(%url, error = %e, "dedup check failed");
            return None;
        }
    }

    let (result, stored_url, wayback_url) = match ctx.fetcher.get(&url).await {
        // HTTP error statuses are not failures here; the response is
        // archived as-is. Only transport errors reach the fallback.
        Ok(result) => (result, url, String::new()),
        Err(e) => {
            tracing::debug!(%url, error = %e, "live fetch failed, trying wayback");

            let snapshot = match ctx.resolver.resolve_snapshot(&url).await {
                Ok(snapshot) => snapshot,
                Err(CveVaultError::SnapshotNotFound(_)) => {
                    tracing::info!(%url, "no wayback snapshot, leaving for a future run");
                    return None;
                }
                Err(e) => {
                    tracing::error!(%url, error = %e, "wayback resolution failed");
                    return None;
                }
            };

            match ctx.store.exists(cve_id, &snapshot) {
                Ok(true) => {
                    tracing::debug!(url = %snapshot, "skipping, snapshot already archived");
                    return None;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(url = %snapshot, error = %e, "dedup check failed");
                    return None;
                }
            }

            match ctx.fetcher.get(&snapshot).await {
                Ok(result) => (result, snapshot.clone(), snapshot),
                Err(e) => {
                    tracing::error!(url = %snapshot, error = %e, "wayback fetch failed");
                    return None;
                }
            }
        }
    };

    let js_required = ctx.classifier.requires_render(&result.body);

    let mut page = ArchivedPage::new(cve_id.to_string(), stored_url);
    page.wayback_url = wayback_url;
    page.html = result.body;
    page.status_code = result.status_code;
    page.headers = result.headers;
    page.js_required = js_required;
    page.completed = !js_required;

    Some(page)
}
