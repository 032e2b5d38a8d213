use std::collections::HashSet;
use std::sync::Mutex;

/// Registry of normalized URLs already taken up for fetching
///
/// Append-only: entries are never removed during a crawl.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url`, returning false if it was already present
    ///
    /// The membership check and the insertion happen under one lock, so at
    /// most one caller wins for any given URL.
    pub fn insert(&self, url: &str) -> bool {
        let mut urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the visited URLs in sorted order
    pub fn snapshot(&self) -> Vec<String> {
        let urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<String> = urls.iter().cloned().collect();
        all.sort();
        all
    }
}
