//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the lifecycle of one crawl:
//! - Starting the worker pool
//! - Bootstrapping every seed domain (robots.txt, sitemaps, root pages)
//! - Waiting until the frontier is quiescent or the product cap is reached
//! - Shutting the workers down and reporting

use crate::config::{validate, Config};
use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::worker::run_worker;
use crate::output::CrawlStatistics;
use crate::ShelfError;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// How often progress is logged while waiting for the crawl to finish
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every enqueued URL was processed and nothing is in flight
    Quiescent,
    /// The product cap was reached
    CapReached,
}

/// The outcome of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Seed domains of the crawl
    pub domains: Vec<String>,
    /// Product page URLs, in discovery order
    pub products: Vec<String>,
    /// Every URL taken up for fetching, sorted
    pub visited: Vec<String>,
    pub stop_reason: StopReason,
    pub stats: CrawlStatistics,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    workers: usize,
    ctx: Arc<CrawlContext>,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ShelfError)` - Invalid configuration or HTTP client failure
    pub fn new(config: &Config) -> Result<Self, ShelfError> {
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.headers)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator that fetches through `fetcher`
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, ShelfError> {
        validate(config)?;
        Ok(Self {
            workers: config.crawler.workers,
            ctx: Arc::new(CrawlContext::new(config, fetcher)?),
        })
    }

    /// The shared state of this crawl
    pub fn context(&self) -> &Arc<CrawlContext> {
        &self.ctx
    }

    /// Runs the crawl to completion
    ///
    /// Workers are started first, then all seed domains are bootstrapped
    /// concurrently. The crawl ends when the frontier is quiescent or the
    /// product cap is reached, whichever comes first; remaining workers are
    /// then cancelled and the fetch limit is closed.
    pub async fn run(self) -> Result<CrawlReport, ShelfError> {
        let ctx = self.ctx;
        tracing::info!(
            "Starting crawl of {} with {} workers",
            ctx.domains.join(", "),
            self.workers
        );
        tracing::debug!(
            "Crawl scope: {}",
            ctx.scope.domains().collect::<Vec<_>>().join(", ")
        );

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(run_worker(id, Arc::clone(&ctx)));
        }

        let seeded = join_all(ctx.domains.iter().map(|domain| bootstrap(&ctx, domain))).await;
        tracing::info!(
            "Bootstrap complete: {} initial URLs queued",
            seeded.iter().sum::<usize>()
        );

        let mut progress = tokio::time::interval(PROGRESS_INTERVAL);
        progress.tick().await;
        let stop_reason = loop {
            tokio::select! {
                _ = ctx.frontier.wait_idle() => break StopReason::Quiescent,
                _ = ctx.products.wait_full() => break StopReason::CapReached,
                _ = progress.tick() => {
                    tracing::info!(
                        "Progress: {} visited, {} queued, {} in flight, {} products",
                        ctx.visited.len(),
                        ctx.frontier.pending(),
                        ctx.frontier.outstanding().saturating_sub(ctx.frontier.pending()),
                        ctx.products.len()
                    );
                }
            }
        };

        match stop_reason {
            StopReason::Quiescent => tracing::info!("Frontier drained, stopping workers"),
            StopReason::CapReached => tracing::info!(
                "Product limit of {} reached, stopping workers",
                ctx.products.cap()
            ),
        }

        workers.abort_all();
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    return Err(e.into());
                }
            }
        }
        ctx.fetch_limit.close();

        let mut stats = ctx.statistics();
        stats.finished_at = Some(Utc::now());

        let report = CrawlReport {
            domains: ctx.domains.clone(),
            products: ctx.products.snapshot(),
            visited: ctx.visited.snapshot(),
            stop_reason,
            stats,
        };
        tracing::info!(
            "Crawl complete. Found {} product URLs across {} visited pages",
            report.products.len(),
            report.visited.len()
        );
        Ok(report)
    }
}

/// Seeds the frontier for one domain
///
/// Fetches robots.txt, abandons the domain if its root is disallowed,
/// resolves its sitemaps, and enqueues both root URLs plus every sitemap
/// URL. Returns the number of URLs enqueued.
async fn bootstrap(ctx: &CrawlContext, domain: &str) -> usize {
    tracing::info!("Starting crawl for domain: {}", domain);
    let cached = ctx
        .gatekeeper
        .fetch_policy(ctx.fetcher.as_ref(), domain, ctx.fetch_timeout)
        .await;

    let http_root = format!("http://{}/", domain);
    if !cached.is_allowed(&http_root, ctx.gatekeeper.agent()) {
        tracing::warn!("Domain {} blocked by robots.txt", domain);
        return 0;
    }

    let sitemap_urls = ctx.sitemaps.resolve(&cached.policy, domain).await;

    let mut initial = vec![http_root, format!("https://{}/", domain)];
    initial.extend(sitemap_urls);

    let enqueued = ctx.enqueue_in_scope(&initial);
    tracing::info!("Queueing {} initial URLs for {}", enqueued, domain);
    enqueued
}
