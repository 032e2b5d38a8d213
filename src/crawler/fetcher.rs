//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the identifying user agent and extra headers
//! - GET requests with a per-request timeout
//! - Error classification
//!
//! The crawl only talks to the network through the [`Fetcher`] trait, so the
//! pipeline can be driven by an in-memory fetcher in tests.

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::time::Duration;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

/// What a response body is, judged from its Content-Type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Xml,
    Other(String),
}

impl FetchResponse {
    /// Body decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Classifies the body by Content-Type
    ///
    /// Anything mentioning `html` (including `application/xhtml+xml`) is HTML;
    /// otherwise anything mentioning `xml` is XML.
    pub fn content_kind(&self) -> ContentKind {
        let content_type = self
            .content_type
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.contains("html") {
            ContentKind::Html
        } else if content_type.contains("xml") {
            ContentKind::Xml
        } else {
            ContentKind::Other(content_type)
        }
    }
}

/// Retrieves documents for the crawler
///
/// Implementations must be usable from many tasks at once.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET for `url`, failing if the exchange takes longer than `timeout`
    ///
    /// Any status code is a successful exchange; only transport failures are errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `headers` - Extra headers sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use sumi_shelf::config::UserAgentConfig;
/// use sumi_shelf::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &BTreeMap::new()).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    headers: &BTreeMap<String, String>,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                default_headers.insert(name, value);
            }
            _ => tracing::warn!("Ignoring invalid header {}: {}", name, value),
        }
    }

    Client::builder()
        .user_agent(config.agent_string())
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent and header configuration
    pub fn from_config(
        config: &UserAgentConfig,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, headers)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(FetchResponse {
            url: final_url,
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Maps a reqwest error onto the crawler's transport taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> FetchResponse {
        FetchResponse {
            url: "https://example.com/".to_string(),
            status: 200,
            content_type: content_type.map(str::to_string),
            body: b"<html></html>".to_vec(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), &BTreeMap::new());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("accept-language".to_string(), "en-US,en;q=0.9".to_string());
        headers.insert("bad header".to_string(), "x".to_string());
        let client = build_http_client(&UserAgentConfig::default(), &headers);
        assert!(client.is_ok());
    }

    #[test]
    fn test_content_kind() {
        assert_eq!(
            response(Some("text/html; charset=utf-8")).content_kind(),
            ContentKind::Html
        );
        assert_eq!(
            response(Some("application/xhtml+xml")).content_kind(),
            ContentKind::Html
        );
        assert_eq!(
            response(Some("application/xml")).content_kind(),
            ContentKind::Xml
        );
        assert_eq!(response(Some("Text/XML")).content_kind(), ContentKind::Xml);
        assert_eq!(
            response(Some("application/pdf")).content_kind(),
            ContentKind::Other("application/pdf".to_string())
        );
        assert_eq!(
            response(None).content_kind(),
            ContentKind::Other(String::new())
        );
    }

    #[test]
    fn test_text_is_lossy() {
        let mut r = response(None);
        r.body = vec![b'o', b'k', 0xff];
        assert!(r.text().starts_with("ok"));
    }
}
