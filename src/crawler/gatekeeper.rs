//! Per-domain politeness: robots.txt permission checks and request throttling
//!
//! Policies and throttle state are both keyed by registered domain, so
//! `www.example.com` and `shop.example.com` share one robots policy and one
//! request clock.

use crate::crawler::Fetcher;
use crate::robots::{fetch_robots, CachedPolicy, PolicyCache};
use crate::state::DomainState;
use crate::url::{registered_domain, registered_domain_of_host};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Robots policy cache plus per-domain request clocks
#[derive(Debug)]
pub struct Gatekeeper {
    agent: String,
    default_delay: Duration,
    policies: PolicyCache,
    domain_states: Mutex<HashMap<String, Arc<tokio::sync::Mutex<DomainState>>>>,
}

impl Gatekeeper {
    /// Creates a gatekeeper for the given agent string
    ///
    /// `default_delay` applies to domains whose robots.txt sets no crawl delay.
    pub fn new(agent: impl Into<String>, default_delay: Duration) -> Self {
        Self {
            agent: agent.into(),
            default_delay,
            policies: PolicyCache::new(),
            domain_states: Mutex::new(HashMap::new()),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Fetches and caches robots.txt for a seed host
    ///
    /// Never fails: an unreachable robots.txt caches the allow-all policy.
    pub async fn fetch_policy(
        &self,
        fetcher: &dyn Fetcher,
        host: &str,
        timeout: Duration,
    ) -> CachedPolicy {
        let cached = fetch_robots(fetcher, host, timeout).await;
        self.policies
            .insert(&registered_domain_of_host(host), cached.clone());
        cached
    }

    /// Returns the cached policy for a registered domain
    pub fn policy(&self, registered: &str) -> Option<CachedPolicy> {
        self.policies.get(registered)
    }

    /// Checks robots.txt for a URL; absent policy means allowed
    pub fn is_allowed(&self, url: &Url) -> bool {
        let Some(registered) = registered_domain(url) else {
            return true;
        };
        match self.policies.get(&registered) {
            Some(cached) => cached.is_allowed(url.as_str(), &self.agent),
            None => true,
        }
    }

    /// Delay between requests to a registered domain
    ///
    /// The robots.txt `Crawl-delay` for our agent when present (zero included),
    /// otherwise the configured default.
    pub fn crawl_delay(&self, registered: &str) -> Duration {
        self.policies
            .get(registered)
            .and_then(|cached| cached.crawl_delay(&self.agent))
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.default_delay)
    }

    fn domain_state(&self, registered: &str) -> Arc<tokio::sync::Mutex<DomainState>> {
        let mut states = self
            .domain_states
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            states
                .entry(registered.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(DomainState::new()))),
        )
    }

    /// Waits until a request to `registered` is permitted, then records it
    ///
    /// The delay check and timestamp update run under the domain's lock, so
    /// callers for the same domain are serialized and their request starts
    /// are spaced by at least the crawl delay. The fetch itself happens
    /// after the lock is released. Returns how long the caller waited.
    pub async fn throttle(&self, registered: &str) -> Duration {
        let state = self.domain_state(registered);
        let mut state = state.lock().await;

        let delay = self.crawl_delay(registered);
        let mut waited = Duration::ZERO;
        if let Some(wait) = state.time_until_next_request(delay, Instant::now()) {
            tracing::debug!(
                "Respecting crawl delay of {:?} for {}, waiting {:?}",
                delay,
                registered,
                wait
            );
            tokio::time::sleep(wait).await;
            waited = wait;
        }

        state.record_request(Instant::now());
        waited
    }

    /// Number of requests recorded for a registered domain
    pub async fn request_count(&self, registered: &str) -> u32 {
        self.domain_state(registered).lock().await.request_count
    }
}
