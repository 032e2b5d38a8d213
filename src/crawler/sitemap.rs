//! Sitemap discovery and expansion
//!
//! Sitemap indexes are followed recursively; leaf sitemaps (optionally
//! gzip-compressed) yield the page URLs they list. Every failure here is
//! logged and skipped: a broken sitemap never stops a crawl.

use crate::crawler::Fetcher;
use crate::robots::RobotsPolicy;
use crate::{ShelfError, SitemapError};
use flate2::read::GzDecoder;
use futures::future::{BoxFuture, FutureExt};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use std::collections::HashSet;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound on a decompressed sitemap (the sitemap protocol caps files at 50MB)
const MAX_SITEMAP_BYTES: u64 = 50 * 1024 * 1024;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: the `<loc>` of each nested `<sitemap>`
    Index(Vec<String>),
    /// `<urlset>`: the `<loc>` of each `<url>`
    UrlSet(Vec<String>),
}

impl SitemapDocument {
    pub fn locations(&self) -> &[String] {
        match self {
            Self::Index(locs) | Self::UrlSet(locs) => locs,
        }
    }
}

/// Parses sitemap XML into an index or a URL set
///
/// Element names are matched on their local part, so namespaced documents
/// (`<sm:loc>`) work too.
pub fn parse_sitemap(xml: &[u8]) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_loc = false;
    let mut locs: Vec<String> = Vec::new();

    let mut saw_urlset = false;
    let mut saw_sitemapindex = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => match e.local_name().as_ref() {
                b"urlset" => saw_urlset = true,
                b"sitemapindex" => saw_sitemapindex = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(XmlEvent::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Ok(XmlEvent::Text(t)) if in_loc => {
                let text = t
                    .unescape()
                    .map_err(|e| SitemapError::Xml(e.to_string()))?;
                push_loc(&mut locs, &text);
            }
            Ok(XmlEvent::CData(c)) if in_loc => {
                push_loc(&mut locs, &String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                return Err(SitemapError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if saw_sitemapindex {
        Ok(SitemapDocument::Index(locs))
    } else if saw_urlset {
        Ok(SitemapDocument::UrlSet(locs))
    } else {
        Err(SitemapError::Xml(
            "document has neither <urlset> nor <sitemapindex>".to_string(),
        ))
    }
}

fn push_loc(locs: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        locs.push(text.to_string());
    }
}

/// True if the body should be gunzipped before parsing
///
/// Detected by a `.gz` URL suffix or the gzip magic bytes.
pub fn is_gzip(url: &str, body: &[u8]) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".gz") || body.starts_with(&[0x1f, 0x8b])
}

/// Gunzips a compressed sitemap body
pub fn decompress(body: &[u8]) -> Result<Vec<u8>, SitemapError> {
    let mut decoder = GzDecoder::new(body).take(MAX_SITEMAP_BYTES);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(SitemapError::Decompress)?;
    Ok(out)
}

/// Decompresses (when needed) and parses a fetched sitemap body
pub fn decode_sitemap(url: &str, body: &[u8]) -> Result<SitemapDocument, SitemapError> {
    if is_gzip(url, body) {
        parse_sitemap(&decompress(body)?)
    } else {
        parse_sitemap(body)
    }
}

/// Fetches and expands sitemaps into page URLs
///
/// Holds the crawl-wide set of sitemap URLs already expanded, so a cyclic
/// index terminates and no sitemap is fetched twice.
pub struct SitemapResolver {
    fetcher: Arc<dyn Fetcher>,
    fetch_limit: Arc<Semaphore>,
    timeout: Duration,
    seen: Mutex<HashSet<String>>,
    expanded: AtomicU64,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, fetch_limit: Arc<Semaphore>, timeout: Duration) -> Self {
        Self {
            fetcher,
            fetch_limit,
            timeout,
            seen: Mutex::new(HashSet::new()),
            expanded: AtomicU64::new(0),
        }
    }

    /// Number of sitemap documents this resolver fetched and parsed
    pub fn expanded(&self) -> u64 {
        self.expanded.load(Ordering::Relaxed)
    }

    /// Marks a sitemap URL as expanded; false if it already was
    pub fn mark_seen(&self, url: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string())
    }

    /// Sitemap URLs to start from for a domain
    ///
    /// The ones declared in robots.txt, or `https://{domain}/sitemap.xml`.
    pub fn candidates(policy: &RobotsPolicy, domain: &str) -> Vec<String> {
        if policy.sitemaps().is_empty() {
            vec![format!("https://{}/sitemap.xml", domain)]
        } else {
            policy.sitemaps().to_vec()
        }
    }

    /// Resolves every sitemap of a domain into a deduplicated list of page URLs
    pub async fn resolve(&self, policy: &RobotsPolicy, domain: &str) -> Vec<String> {
        let candidates = Self::candidates(policy, domain);
        tracing::info!(
            "Processing {} sitemap(s) for {}",
            candidates.len(),
            domain
        );

        let mut found = Vec::new();
        for sitemap_url in &candidates {
            found.extend(self.expand(sitemap_url).await);
        }
        dedup(found)
    }

    /// Expands one sitemap URL (index or leaf) into page URLs
    ///
    /// Returns an empty list if the sitemap was already expanded or failed.
    pub async fn expand(&self, sitemap_url: &str) -> Vec<String> {
        self.expand_boxed(sitemap_url.to_string()).await
    }

    /// Expands an already fetched document
    ///
    /// Leaf locations are returned as-is; nested sitemaps of an index are
    /// fetched and expanded.
    pub async fn expand_document(&self, document: SitemapDocument) -> Vec<String> {
        match document {
            SitemapDocument::UrlSet(locs) => dedup(locs),
            SitemapDocument::Index(nested) => {
                let mut found = Vec::new();
                for nested_url in &nested {
                    tracing::debug!("Found nested sitemap URL: {}", nested_url);
                    found.extend(self.expand(nested_url).await);
                }
                dedup(found)
            }
        }
    }

    fn expand_boxed(&self, sitemap_url: String) -> BoxFuture<'_, Vec<String>> {
        async move {
            if !self.mark_seen(&sitemap_url) {
                tracing::debug!("Sitemap {} already expanded, skipping", sitemap_url);
                return Vec::new();
            }

            match self.fetch_document(&sitemap_url).await {
                Ok(document) => {
                    self.expanded.fetch_add(1, Ordering::Relaxed);
                    let found = self.expand_document(document).await;
                    tracing::info!("Processed sitemap {}, found {} URLs", sitemap_url, found.len());
                    found
                }
                Err(e) => {
                    tracing::warn!("Error processing sitemap {}: {}", sitemap_url, e);
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    async fn fetch_document(&self, sitemap_url: &str) -> Result<SitemapDocument, ShelfError> {
        tracing::debug!("Fetching sitemap: {}", sitemap_url);

        let response = {
            let _permit = self
                .fetch_limit
                .acquire()
                .await
                .map_err(|_| SitemapError::Xml("fetch limit closed".to_string()))?;
            self.fetcher.get(sitemap_url, self.timeout).await?
        };

        if response.status != 200 {
            return Err(SitemapError::Status {
                url: sitemap_url.to_string(),
                status: response.status,
            }
            .into());
        }

        let url = sitemap_url.to_string();
        let document =
            tokio::task::spawn_blocking(move || decode_sitemap(&url, &response.body)).await??;
        Ok(document)
    }
}

/// Removes duplicates while keeping first-seen order
fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
