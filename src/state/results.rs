use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::watch;

/// Outcome of recording a product URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductInsert {
    /// New product recorded
    Added,
    /// URL was already recorded
    Duplicate,
    /// Cap already reached; URL dropped
    Rejected,
}

#[derive(Debug, Default)]
struct Inner {
    urls: Vec<String>,
    seen: HashSet<String>,
    detections: u64,
}

/// Deduplicated, capped collection of product page URLs
///
/// Once `cap` unique URLs are recorded no further URL is accepted, and every
/// waiter on [`ProductResults::wait_full`] is released.
#[derive(Debug)]
pub struct ProductResults {
    cap: usize,
    inner: Mutex<Inner>,
    full: watch::Sender<bool>,
}

impl ProductResults {
    pub fn new(cap: usize) -> Self {
        let (full, _) = watch::channel(cap == 0);
        Self {
            cap,
            inner: Mutex::new(Inner::default()),
            full,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Records a product URL
    pub fn insert(&self, url: &str) -> ProductInsert {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.detections += 1;

        if inner.seen.contains(url) {
            return ProductInsert::Duplicate;
        }
        if inner.urls.len() >= self.cap {
            return ProductInsert::Rejected;
        }

        inner.seen.insert(url.to_string());
        inner.urls.push(url.to_string());
        if inner.urls.len() >= self.cap {
            self.full.send_replace(true);
        }
        ProductInsert::Added
    }

    /// True once the cap is reached
    pub fn is_full(&self) -> bool {
        *self.full.borrow()
    }

    /// Resolves once the cap is reached
    pub async fn wait_full(&self) {
        let mut rx = self.full.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|full| *full).await;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of positive classifications, duplicates and rejections included
    pub fn detections(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).detections
    }

    /// Product URLs in the order they were found
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .urls
            .clone()
    }
}
