//! Crawl statistics
//!
//! This module collects per-crawl counters while workers run and
//! prints them once a domain's crawl is finished.

use crate::state::UrlState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,

    /// URLs taken off the frontier
    pub urls_processed: u64,

    /// HTML pages fetched and classified
    pub pages_classified: u64,

    /// Sitemap documents expanded, both at bootstrap and found while crawling
    pub sitemaps_expanded: u64,

    /// URLs put on the frontier
    pub urls_enqueued: u64,

    /// Unique product pages recorded
    pub products_found: u64,

    /// Positive classifications, duplicates included
    pub product_detections: u64,

    /// Count of discarded URLs by reason label
    pub discards_by_reason: HashMap<&'static str, u64>,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            urls_processed: 0,
            pages_classified: 0,
            sitemaps_expanded: 0,
            urls_enqueued: 0,
            products_found: 0,
            product_detections: 0,
            discards_by_reason: HashMap::new(),
        }
    }

    /// Records the terminal state of one processed URL
    pub fn record(&mut self, state: &UrlState) {
        self.urls_processed += 1;
        match state {
            UrlState::Classified => self.pages_classified += 1,
            UrlState::Discarded(reason) => {
                *self.discards_by_reason.entry(reason.as_str()).or_insert(0) += 1;
            }
            UrlState::Enqueued | UrlState::Fetching => {}
        }
    }

    pub fn total_discarded(&self) -> u64 {
        self.discards_by_reason.values().sum()
    }

    pub fn discarded(&self, reason: &str) -> u64 {
        self.discards_by_reason.get(reason).copied().unwrap_or(0)
    }

    /// Wall-clock duration, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `domain` - The seed domain the statistics belong to
/// * `stats` - The statistics to display
pub fn print_statistics(domain: &str, stats: &CrawlStatistics) {
    println!("=== Crawl Statistics: {} ===\n", domain);

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(duration) = stats.duration() {
        println!("  Duration: {}s", duration.num_seconds());
    }
    println!("  URLs processed: {}", stats.urls_processed);
    println!("  URLs enqueued: {}", stats.urls_enqueued);
    println!("  Pages classified: {}", stats.pages_classified);
    println!("  Sitemaps expanded: {}", stats.sitemaps_expanded);
    println!(
        "  Product pages: {} ({} detections)",
        stats.products_found, stats.product_detections
    );
    println!();

    if !stats.discards_by_reason.is_empty() {
        println!("Discarded URLs ({}):", stats.total_discarded());
        // Sort reasons by count (descending)
        let mut reason_counts: Vec<_> = stats.discards_by_reason.iter().collect();
        reason_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (reason, count) in reason_counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }
}
