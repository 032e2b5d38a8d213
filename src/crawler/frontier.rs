//! The crawl frontier
//!
//! A FIFO of pending URLs shared by all workers, plus a counter of work that
//! is either queued or being processed. The crawl is quiescent when that
//! counter reaches zero.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{watch, Notify};

/// Concurrency-safe FIFO with completion tracking
///
/// Duplicates are allowed; the visited set filters them when they are
/// dequeued.
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<String>>,
    available: Notify,
    /// Queued plus in-flight items
    outstanding: watch::Sender<usize>,
}

/// A URL taken off the frontier
///
/// Dropping the item acknowledges it, whether processing finished or the
/// worker holding it was cancelled. Acknowledged items are never re-queued.
#[derive(Debug)]
pub struct WorkItem<'a> {
    url: String,
    frontier: &'a Frontier,
}

impl WorkItem<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for WorkItem<'_> {
    fn drop(&mut self) {
        self.frontier.acknowledge();
    }
}

impl Frontier {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            outstanding,
        }
    }

    /// Adds a URL to the back of the queue
    pub fn enqueue(&self, url: impl Into<String>) {
        self.outstanding.send_modify(|n| *n += 1);
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(url.into());
        self.available.notify_one();
    }

    /// Waits for the next URL
    pub async fn dequeue(&self) -> WorkItem<'_> {
        loop {
            let notified = self.available.notified();
            if let Some(url) = self.try_pop() {
                return WorkItem {
                    url,
                    frontier: self,
                };
            }
            notified.await;
        }
    }

    /// Takes the next URL without waiting
    pub fn try_dequeue(&self) -> Option<WorkItem<'_>> {
        self.try_pop().map(|url| WorkItem {
            url,
            frontier: self,
        })
    }

    fn try_pop(&self) -> Option<String> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    fn acknowledge(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Number of URLs waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of URLs queued or being processed
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolves once every enqueued URL has been acknowledged
    ///
    /// Returns immediately if nothing is outstanding.
    pub async fn wait_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
