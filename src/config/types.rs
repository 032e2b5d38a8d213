use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Static-resource extensions skipped before any fetch
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "css", "js", "ico", "svg", "woff", "woff2", "ttf", "eot", "mp4",
    "mp3", "zip", "gz", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "webp", "avi", "mov",
    "mkv", "rar", "7z", "tar", "bz2", "mpg", "mpeg",
];

/// URL patterns that mark a page as a product page
pub const DEFAULT_PRODUCT_PATTERNS: &[&str] = &[
    r"/product/",
    r"/products/",
    r"/p/",
    r"(?i)\b(?:id|sku|product_id)=[0-9]+",
    r"/item/",
    r"/p-[a-zA-Z0-9]+",
];

/// Main configuration structure for Sumi-Shelf
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed domains, e.g. `www.example.com`
    pub domains: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    /// Extra request headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of workers draining the frontier
    pub workers: usize,

    /// Maximum number of simultaneous in-flight fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,

    /// Stop once this many product pages were found
    #[serde(rename = "max-products")]
    pub max_products: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Delay between requests to a domain whose robots.txt sets none (milliseconds)
    #[serde(rename = "default-crawl-delay-ms")]
    pub default_crawl_delay_ms: u64,

    /// Drop the query string when building URL keys
    #[serde(rename = "strip-query")]
    pub strip_query: bool,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn default_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.default_crawl_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_concurrent_fetches: 5,
            max_products: 100,
            fetch_timeout_secs: 10,
            default_crawl_delay_ms: 1000,
            strip_query: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Full agent string used verbatim instead of the formatted one
    #[serde(rename = "override")]
    pub override_string: Option<String>,
}

impl UserAgentConfig {
    /// The identifying agent string sent to servers and matched against robots.txt
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn agent_string(&self) -> String {
        match &self.override_string {
            Some(agent) => agent.clone(),
            None => format!(
                "{}/{} (+{}; {})",
                self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
            ),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiShelf".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-shelf".to_string(),
            contact_email: "crawler@example.com".to_string(),
            override_string: None,
        }
    }
}

/// URL filters: what to skip and what counts as a product
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(rename = "static-extensions")]
    pub static_extensions: Vec<String>,

    /// Regular expressions matched against the page URL
    #[serde(rename = "product-patterns")]
    pub product_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            static_extensions: DEFAULT_STATIC_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            product_patterns: DEFAULT_PRODUCT_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one `<domain>_urls.txt` file per seed domain
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}

impl Config {
    /// Builds a configuration with defaults for the given seed domains
    pub fn for_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            headers: BTreeMap::new(),
            filters: FilterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::for_domains(["example.com"]);
        assert_eq!(config.crawler.workers, 10);
        assert_eq!(config.crawler.max_concurrent_fetches, 5);
        assert_eq!(config.crawler.max_products, 100);
        assert_eq!(config.crawler.default_crawl_delay(), Duration::from_secs(1));
        assert!(config.crawler.strip_query);
        assert!(config.filters.static_extensions.contains(&"png".to_string()));
        assert_eq!(config.filters.product_patterns.len(), 6);
    }

    #[test]
    fn test_agent_string_format() {
        let ua = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            override_string: None,
        };
        assert_eq!(
            ua.agent_string(),
            "TestBot/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_agent_string_override() {
        let ua = UserAgentConfig {
            override_string: Some("Mozilla/5.0 ShelfBot".to_string()),
            ..UserAgentConfig::default()
        };
        assert_eq!(ua.agent_string(), "Mozilla/5.0 ShelfBot");
    }
}
