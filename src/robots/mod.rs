//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.

mod cache;
mod parser;

pub use cache::{CachedPolicy, PolicyCache, PolicySource};
pub use parser::{product_token, RobotsPolicy};

use crate::crawler::Fetcher;
use std::time::Duration;

/// Fetches robots.txt for a domain from `https://{domain}/robots.txt`
///
/// A missing or unreachable robots.txt is not an error: any transport
/// failure or non-200 status yields the allow-all policy, tagged
/// [`PolicySource::Default`].
pub async fn fetch_robots(fetcher: &dyn Fetcher, domain: &str, timeout: Duration) -> CachedPolicy {
    let robots_url = format!("https://{}/robots.txt", domain);
    tracing::debug!("Fetching {}", robots_url);

    match fetcher.get(&robots_url, timeout).await {
        Ok(response) if response.status == 200 => {
            let content = response.text();
            let policy = RobotsPolicy::from_content(&content);
            tracing::info!(
                "Found robots.txt for {} ({} lines, {} sitemaps)",
                domain,
                content.lines().count(),
                policy.sitemaps().len()
            );
            CachedPolicy::new(policy, PolicySource::Fetched)
        }
        Ok(response) => {
            tracing::info!(
                "robots.txt for {} returned HTTP {}, allowing all",
                domain,
                response.status
            );
            CachedPolicy::new(RobotsPolicy::allow_all(), PolicySource::Default)
        }
        Err(e) => {
            tracing::warn!("Could not fetch robots.txt for {}: {}", domain, e);
            CachedPolicy::new(RobotsPolicy::allow_all(), PolicySource::Default)
        }
    }
}
