//! Sumi-Shelf: a polite product-page crawler
//!
//! This crate crawls a restricted set of seed domains, respecting robots.txt
//! and per-domain crawl delays, and collects the URLs of pages that look like
//! e-commerce product pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Shelf operations
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid product pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Transport failures reported by a fetcher
///
/// None of these are retried; the URL that produced one is abandoned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Returns the URL the failed request was issued for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Connect { url, .. } | Self::Transport { url, .. } => url,
        }
    }
}

/// Sitemap document failures
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Sitemap {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed sitemap XML: {0}")]
    Xml(String),

    #[error("Failed to decompress sitemap: {0}")]
    Decompress(#[source] std::io::Error),
}

/// Result type alias for Sumi-Shelf operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport};
pub use state::{DiscardReason, UrlState};
pub use url::{normalize_url, registered_domain};
