//! Crawler module for product page discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML parsing, link extraction and product classification
//! - Sitemap expansion
//! - The frontier, per-domain politeness and the worker pool
//! - Overall crawl coordination

pub mod classifier;
mod context;
mod coordinator;
mod fetcher;
mod frontier;
mod gatekeeper;
mod parser;
pub mod sitemap;
mod worker;

pub use classifier::{ProductClassifier, ProductSignal};
pub use context::CrawlContext;
pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use fetcher::{build_http_client, ContentKind, FetchResponse, Fetcher, HttpFetcher};
pub use frontier::{Frontier, WorkItem};
pub use gatekeeper::Gatekeeper;
pub use parser::{has_product_schema, is_product_type, parse_html, ParsedPage, StructuredData};
pub use sitemap::{SitemapDocument, SitemapResolver};
pub use worker::process_url;

use crate::config::Config;
use crate::output::{print_statistics, ResultSink, TextFileSink};
use crate::ShelfError;
use futures::future::join_all;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. Every seed domain gets
/// its own coordinator (frontier, worker pool, fetch limit and product cap),
/// and all of them run concurrently over one shared HTTP client. Each
/// domain's product URLs are written to `<output.directory>/<domain>_urls.txt`
/// as soon as its crawl finishes.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Vec<CrawlReport>)` - One report per seed domain, in configuration order
/// * `Err(ShelfError)` - A crawl could not be set up or its results not saved
pub async fn crawl(config: Config) -> Result<Vec<CrawlReport>, ShelfError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.headers)?;
    let sink = TextFileSink::new(&config.output.directory);
    crawl_with(&config, Arc::new(fetcher), &sink).await
}

/// Runs one coordinator per seed domain through the given fetcher and sink
pub async fn crawl_with(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    sink: &dyn ResultSink,
) -> Result<Vec<CrawlReport>, ShelfError> {
    let runs = config.domains.iter().map(|domain| {
        let domain_config = Config {
            domains: vec![domain.clone()],
            ..config.clone()
        };
        let fetcher = Arc::clone(&fetcher);
        async move {
            let report = Coordinator::with_fetcher(&domain_config, fetcher)?
                .run()
                .await?;
            tracing::debug!("Writing results for {} to the {} sink", domain, sink.name());
            sink.write_results(domain, &report.products)?;
            print_statistics(domain, &report.stats);
            Ok::<_, ShelfError>(report)
        }
    });

    join_all(runs).await.into_iter().collect()
}
