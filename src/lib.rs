//! # cvevault
//!
//! Archives web pages referenced by CVE records.
//!
//! ## Architecture
//!
//! One invocation makes two passes over a shared SQLite store:
//!
//! ```text
//! Dataset → Filter/FanIn → Crawl pipeline → Store ⇄ Render pipeline → Store
//! ```
//!
//! The crawl pipeline fetches every URL of every dataset element through a
//! bounded worker pool, substituting a Wayback Machine snapshot when the live
//! fetch fails at the transport level, and persists each result exactly once
//! keyed on (cve_id, url). Pages whose body looks script-dependent are
//! flagged; the render pipeline then materializes them with a shared headless
//! Chrome instance and marks them complete.
//!
//! Re-running over the same dataset is always safe: archived pairs are
//! skipped, completed renders are skipped, and anything that failed is
//! retried.
//!
//! ## Modules
//!
//! - [`app`]: application context and error types
//! - [`cli`]: command-line interface
//! - [`config`]: crawl and renderer configuration
//! - [`dataset`]: streaming dataset decode, filter lanes, fan-in
//! - [`domain`]: [`ArchivedPage`](domain::ArchivedPage), render classification
//! - [`fetcher`]: HTTP fetching (reqwest)
//! - [`wayback`]: Wayback Machine CDX snapshot resolution
//! - [`renderer`]: headless Chrome rendering (chromiumoxide)
//! - [`pipeline`]: the crawl and render worker pools
//! - [`store`]: SQLite persistence behind the [`Store`](store::Store) trait

pub mod app;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod fetcher;
pub mod pipeline;
pub mod renderer;
pub mod store;
pub mod wayback;
