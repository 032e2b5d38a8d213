//! Robots.txt policy cache
//!
//! Policies are cached per registered domain for the lifetime of a crawl.

use crate::robots::RobotsPolicy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Where a cached policy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    /// robots.txt was fetched and parsed
    Fetched,
    /// robots.txt was unreachable or not 200; everything is allowed
    Default,
}

/// Cached robots.txt data for a domain
#[derive(Debug, Clone)]
pub struct CachedPolicy {
    pub policy: Arc<RobotsPolicy>,
    pub source: PolicySource,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPolicy {
    pub fn new(policy: RobotsPolicy, source: PolicySource) -> Self {
        Self {
            policy: Arc::new(policy),
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if a URL is allowed according to the cached policy
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.policy.is_allowed(url, user_agent)
    }

    /// Gets the crawl delay (seconds) from the cached policy
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.policy.crawl_delay(user_agent)
    }
}

/// Thread-safe map from registered domain to its robots policy
#[derive(Debug, Default)]
pub struct PolicyCache {
    entries: RwLock<HashMap<String, CachedPolicy>>,
}

impl PolicyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores (or replaces) the policy for a registered domain
    pub fn insert(&self, domain: &str, cached: CachedPolicy) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(domain.to_string(), cached);
    }

    /// Returns the cached policy for a registered domain, if any
    pub fn get(&self, domain: &str) -> Option<CachedPolicy> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(domain).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
