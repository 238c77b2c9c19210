use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cvevault::app::AppContext;
use cvevault::cli::Cli;
use cvevault::config::Config;
use cvevault::renderer::ChromeRenderer;
use cvevault::store::Store;
use cvevault::{dataset, pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(workers) = cli.workers {
        config.crawl.workers = workers;
    }

    let file = File::open(&cli.dataset)
        .with_context(|| format!("cannot open dataset {}", cli.dataset.display()))?;

    let ctx = AppContext::new(&cli.db, config)?;
    let workers = ctx.config.crawl.workers;

    let source = dataset::read_dataset(BufReader::new(file));
    let merged = dataset::fan_in(dataset::spawn_filter_lanes(source, workers));

    pipeline::fetch_and_store(
        ctx.store.clone(),
        ctx.fetcher.clone(),
        ctx.resolver.clone(),
        ctx.classifier.clone(),
        merged,
        &ctx.config.crawl,
    )
    .await;

    // Launch the browser only when render work exists; the pipeline
    // re-queries the job set itself.
    match ctx.store.find_pages_needing_render() {
        Ok(jobs) if jobs.is_empty() => {
            tracing::info!("no pages need rendering");
        }
        Ok(_) => {
            let renderer = Arc::new(ChromeRenderer::new(ctx.config.renderer.clone()).await?);
            if let Err(e) =
                pipeline::render_required_pages(ctx.store.clone(), renderer, workers).await
            {
                tracing::error!(error = %e, "render pipeline failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "render job query failed");
        }
    }

    Ok(())
}
