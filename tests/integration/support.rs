//! An in-memory site served through the `Fetcher` trait

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sumi_shelf::config::Config;
use sumi_shelf::crawler::{FetchResponse, Fetcher};
use sumi_shelf::FetchError;

struct Page {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    final_url: Option<String>,
}

/// Canned responses keyed by URL; anything else fails to connect
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, Page>,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    fn serve(mut self, url: &str, status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        self.pages.insert(
            url.to_string(),
            Page {
                status,
                content_type,
                body,
                final_url: None,
            },
        );
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.serve(url, 200, "text/html; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn xml(self, url: &str, body: &str) -> Self {
        self.serve(url, 200, "application/xml", body.as_bytes().to_vec())
    }

    pub fn gzip_xml(self, url: &str, body: &str) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        self.serve(url, 200, "application/x-gzip", encoder.finish().unwrap())
    }

    pub fn text(self, url: &str, body: &str) -> Self {
        self.serve(url, 200, "text/plain", body.as_bytes().to_vec())
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.serve(url, status, "text/html", Vec::new())
    }

    /// Serves `body` at `url` as if the request had been redirected to `final_url`
    pub fn redirected_html(mut self, url: &str, final_url: &str, body: &str) -> Self {
        self = self.html(url, body);
        if let Some(page) = self.pages.get_mut(url) {
            page.final_url = Some(final_url.to_string());
        }
        self
    }

    /// Every requested URL, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests().iter().any(|requested| requested == url)
    }

    /// Times at which URLs matching `filter` were requested
    pub fn request_times(&self, filter: impl Fn(&str) -> bool) -> Vec<Instant> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| filter(url))
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        match self.pages.get(url) {
            Some(page) => Ok(FetchResponse {
                url: page.final_url.clone().unwrap_or_else(|| url.to_string()),
                status: page.status,
                content_type: Some(page.content_type.to_string()),
                body: page.body.clone(),
            }),
            None => Err(FetchError::Connect {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Configuration for tests: small worker pool and short delays
pub fn test_config(domain: &str) -> Config {
    let mut config = Config::for_domains([domain]);
    config.crawler.workers = 4;
    config.crawler.max_concurrent_fetches = 2;
    config.crawler.fetch_timeout_secs = 5;
    config.crawler.default_crawl_delay_ms = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}
