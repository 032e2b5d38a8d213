//! Shared state of one crawl
//!
//! Everything the workers of a crawl share lives in one [`CrawlContext`]
//! behind an `Arc`; nothing is global, so several crawls can run side by
//! side in one process.

use crate::config::Config;
use crate::crawler::classifier::ProductClassifier;
use crate::crawler::frontier::Frontier;
use crate::crawler::gatekeeper::Gatekeeper;
use crate::crawler::sitemap::SitemapResolver;
use crate::crawler::Fetcher;
use crate::output::CrawlStatistics;
use crate::state::{ProductResults, UrlState, VisitedSet};
use crate::url::{normalize_url, CrawlScope};
use crate::ShelfError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Per-crawl configuration and shared state
pub struct CrawlContext {
    /// Seed domains, as configured
    pub domains: Vec<String>,
    /// Registered domains the crawl may visit
    pub scope: CrawlScope,
    pub static_extensions: Vec<String>,
    pub strip_query: bool,
    pub fetch_timeout: Duration,
    pub classifier: ProductClassifier,
    pub fetcher: Arc<dyn Fetcher>,
    /// Bounds simultaneous in-flight fetches across all workers
    pub fetch_limit: Arc<Semaphore>,
    pub gatekeeper: Gatekeeper,
    pub sitemaps: SitemapResolver,
    pub frontier: Frontier,
    pub visited: VisitedSet,
    pub products: ProductResults,
    stats: Mutex<CrawlStatistics>,
}

impl CrawlContext {
    /// Builds the context for crawling `config.domains` through `fetcher`
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, ShelfError> {
        let crawler = &config.crawler;
        let classifier = ProductClassifier::from_config(&config.filters)?;
        let fetch_limit = Arc::new(Semaphore::new(crawler.max_concurrent_fetches));

        Ok(Self {
            domains: config.domains.clone(),
            scope: CrawlScope::from_seeds(&config.domains),
            static_extensions: config.filters.static_extensions.clone(),
            strip_query: crawler.strip_query,
            fetch_timeout: crawler.fetch_timeout(),
            classifier,
            sitemaps: SitemapResolver::new(
                Arc::clone(&fetcher),
                Arc::clone(&fetch_limit),
                crawler.fetch_timeout(),
            ),
            fetcher,
            fetch_limit,
            gatekeeper: Gatekeeper::new(
                config.user_agent.agent_string(),
                crawler.default_crawl_delay(),
            ),
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            products: ProductResults::new(crawler.max_products),
            stats: Mutex::new(CrawlStatistics::new()),
        })
    }

    /// Enqueues the URLs inside the crawl scope
    ///
    /// The scope is judged on the normalized key, but the URL is queued as
    /// found so product patterns can still see its query string. Returns how
    /// many were enqueued.
    pub fn enqueue_in_scope<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut enqueued = 0;
        for raw in urls {
            let raw = raw.as_ref();
            let url = match normalize_url(raw, self.strip_query) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Not enqueuing {}: {}", raw, e);
                    continue;
                }
            };
            if !self.scope.contains(&url) {
                tracing::trace!("Not enqueuing off-domain URL {}", url);
                continue;
            }
            self.frontier.enqueue(raw.trim());
            enqueued += 1;
        }

        self.with_stats(|stats| stats.urls_enqueued += enqueued as u64);
        enqueued
    }

    /// Records the terminal state of a processed URL
    pub fn record(&self, state: &UrlState) {
        self.with_stats(|stats| stats.record(state));
    }

    /// Counts one expanded sitemap document
    pub fn record_sitemap(&self) {
        self.with_stats(|stats| stats.sitemaps_expanded += 1);
    }

    /// Snapshot of the statistics so far
    pub fn statistics(&self) -> CrawlStatistics {
        let mut stats = self.with_stats(|stats| stats.clone());
        stats.sitemaps_expanded += self.sitemaps.expanded();
        stats.products_found = self.products.len() as u64;
        stats.product_detections = self.products.detections();
        stats
    }

    pub(crate) fn with_stats<T>(&self, f: impl FnOnce(&mut CrawlStatistics) -> T) -> T {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut stats)
    }
}
