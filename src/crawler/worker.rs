//! The per-URL pipeline and the worker loop that drives it
//!
//! Each step can end a URL's journey early with a [`DiscardReason`]; nothing
//! in here is fatal to the crawl.

use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::{ContentKind, FetchResponse};
use crate::crawler::parser::parse_html;
use crate::crawler::sitemap::decode_sitemap;
use crate::state::{DiscardReason, ProductInsert, UrlState};
use crate::url::{is_static_resource, normalize_url};
use std::sync::Arc;
use url::Url;

/// Drains the frontier until the task is aborted
///
/// Each dequeued item is acknowledged when it goes out of scope, including
/// when the task is cancelled mid-processing.
pub async fn run_worker(id: usize, ctx: Arc<CrawlContext>) {
    tracing::debug!("Worker {} started", id);
    loop {
        let item = ctx.frontier.dequeue().await;
        tracing::trace!("Worker {} processing: {}", id, item.url());

        let state = process_url(&ctx, item.url()).await;
        match &state {
            UrlState::Discarded(reason) => {
                tracing::debug!("Discarded {}: {}", item.url(), reason)
            }
            _ => tracing::trace!("Worker {} completed: {}", id, item.url()),
        }
        ctx.record(&state);
    }
}

/// Runs one URL through the pipeline and returns its terminal state
///
/// `raw_url` is the URL as it was found. Its normalized form is the key for
/// the scope, robots and visited checks, for the fetch and for the recorded
/// product; product URL patterns are matched against `raw_url` itself so a
/// query such as `?id=5` still counts.
///
/// Work stops early once the product cap is reached. Static resources and
/// URLs outside the crawl scope are dropped next, then anything already
/// visited. Surviving URLs wait out the domain's crawl delay, are checked
/// against robots.txt and marked visited (losing a race to another worker
/// also discards). The fetch runs under the global fetch limit; a non-200
/// status or content that is neither HTML nor XML ends the URL there. XML is
/// expanded as a sitemap and its URLs enqueued. HTML is classified, products
/// recorded and in-scope links enqueued.
pub async fn process_url(ctx: &CrawlContext, raw_url: &str) -> UrlState {
    if ctx.products.is_full() {
        return UrlState::Discarded(DiscardReason::CapReached);
    }

    let url = match normalize_url(raw_url, ctx.strip_query) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Invalid URL {}: {}", raw_url, e);
            return UrlState::Discarded(DiscardReason::InvalidUrl);
        }
    };

    if is_static_resource(&url, &ctx.static_extensions) {
        return UrlState::Discarded(DiscardReason::StaticResource);
    }

    let Some(registered) = ctx.scope.registered_domain_of(&url) else {
        return UrlState::Discarded(DiscardReason::OffDomain);
    };

    // Known duplicates never wait on the throttle; the insert below still decides
    if ctx.visited.contains(url.as_str()) {
        return UrlState::Discarded(DiscardReason::AlreadyVisited);
    }

    ctx.gatekeeper.throttle(&registered).await;

    if !ctx.gatekeeper.is_allowed(&url) {
        tracing::info!("Blocked by robots.txt: {}", url);
        return UrlState::Discarded(DiscardReason::RobotsDenied);
    }

    if !ctx.visited.insert(url.as_str()) {
        return UrlState::Discarded(DiscardReason::AlreadyVisited);
    }

    let response = match fetch(ctx, &url).await {
        Ok(response) => response,
        Err(reason) => return UrlState::Discarded(reason),
    };

    match response.content_kind() {
        ContentKind::Xml => expand_sitemap(ctx, &url, response).await,
        ContentKind::Html => classify_page(ctx, raw_url, url, response).await,
        ContentKind::Other(content_type) => {
            tracing::debug!("Non-HTML content at {}: {}", url, content_type);
            UrlState::Discarded(DiscardReason::UnsupportedContent(content_type))
        }
    }
}

async fn fetch(ctx: &CrawlContext, url: &Url) -> Result<FetchResponse, DiscardReason> {
    // The permit is only closed once the crawl shuts down
    let Ok(_permit) = ctx.fetch_limit.acquire().await else {
        return Err(DiscardReason::FetchFailed);
    };

    tracing::debug!("Fetching: {}", url);
    let response = match ctx.fetcher.get(url.as_str(), ctx.fetch_timeout).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Error processing {}: {}", url, e);
            return Err(DiscardReason::FetchFailed);
        }
    };

    tracing::debug!("Response: {} - Status {}", url, response.status);
    if response.status != 200 {
        return Err(DiscardReason::HttpStatus(response.status));
    }
    Ok(response)
}

async fn expand_sitemap(ctx: &CrawlContext, url: &Url, response: FetchResponse) -> UrlState {
    let sitemap_url = url.to_string();
    let decoded =
        tokio::task::spawn_blocking(move || decode_sitemap(&sitemap_url, &response.body)).await;

    let document = match decoded {
        Ok(Ok(document)) => document,
        Ok(Err(e)) => {
            tracing::warn!("Error parsing sitemap {}: {}", url, e);
            return UrlState::Discarded(DiscardReason::MalformedSitemap);
        }
        Err(e) => {
            tracing::warn!("Sitemap parse task failed for {}: {}", url, e);
            return UrlState::Discarded(DiscardReason::MalformedSitemap);
        }
    };

    ctx.sitemaps.mark_seen(url.as_str());
    ctx.record_sitemap();
    let found = ctx.sitemaps.expand_document(document).await;
    let enqueued = ctx.enqueue_in_scope(&found);
    tracing::info!(
        "Found {} URLs in sitemap {} ({} enqueued)",
        found.len(),
        url,
        enqueued
    );
    UrlState::Classified
}

async fn classify_page(
    ctx: &CrawlContext,
    raw_url: &str,
    url: Url,
    response: FetchResponse,
) -> UrlState {
    let base_url = Url::parse(&response.url).unwrap_or_else(|_| url.clone());
    let strip_query = ctx.strip_query;
    let html = response.text();

    let parsed =
        match tokio::task::spawn_blocking(move || parse_html(&html, &base_url, strip_query)).await
        {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("HTML parse task failed for {}: {}", url, e);
                return UrlState::Discarded(DiscardReason::FetchFailed);
            }
        };

    if let Some(signal) = ctx
        .classifier
        .classify(raw_url.trim(), parsed.has_product_schema)
    {
        match ctx.products.insert(url.as_str()) {
            ProductInsert::Added => {
                tracing::info!("Product page detected ({:?}): {}", signal, url)
            }
            ProductInsert::Duplicate => tracing::debug!("Product already recorded: {}", url),
            ProductInsert::Rejected => {
                tracing::debug!("Product cap reached, dropping {}", url)
            }
        }
    }

    let enqueued = ctx.enqueue_in_scope(&parsed.links);
    tracing::debug!(
        "Found {} links on {} ({} in scope)",
        parsed.links.len(),
        url,
        enqueued
    );
    UrlState::Classified
}
