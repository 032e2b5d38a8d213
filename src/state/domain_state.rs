use std::time::Duration;
use tokio::time::Instant;

/// Tracks the request timing of one registered domain
///
/// The gatekeeper keeps one of these per domain behind an async mutex; the
/// delay check and the timestamp update happen while that lock is held.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests started against this domain
    pub request_count: u32,

    /// Start time of the last request to this domain
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no recorded requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was started at `now`
    ///
    /// The timestamp never moves backwards.
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(match self.last_request_time {
            Some(last) if last > now => last,
            _ => now,
        });
    }
}
