//! HTML parser for extracting links and structured data
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (anchor and link tags, `og:url` meta tags, Product JSON-LD urls)
//! - Whether the page declares a schema.org `Product`

use crate::url::normalize_url;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// The JSON-LD payload of one `<script type="application/ld+json">` block
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredData {
    /// Empty, malformed, or not an object or list
    Absent,
    /// A single JSON-LD object
    Single(Value),
    /// A top-level JSON-LD array
    List(Vec<Value>),
}

impl StructuredData {
    /// Parses the text of a JSON-LD block
    ///
    /// Malformed JSON is not an error; the block is simply absent.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => Self::Single(Value::Object(map)),
            Ok(Value::Array(items)) => Self::List(items),
            Ok(_) => Self::Absent,
            Err(e) => {
                tracing::trace!("Skipping malformed JSON-LD block: {}", e);
                Self::Absent
            }
        }
    }

    /// The objects carried by this block
    pub fn items(&self) -> &[Value] {
        match self {
            Self::Absent => &[],
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(items) => items,
        }
    }

    /// True if any object in the block is typed `Product`
    pub fn has_product(&self) -> bool {
        self.items().iter().any(is_product_type)
    }

    /// `url` fields of the Product objects in the block
    pub fn product_urls(&self) -> impl Iterator<Item = &str> {
        self.items()
            .iter()
            .filter(|item| is_product_type(item))
            .filter_map(|item| item.get("url").and_then(Value::as_str))
    }
}

/// True if a JSON-LD object declares `@type: Product` (alone or within a type array)
pub fn is_product_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Candidate URLs found on the page, normalized and deduplicated
    pub links: Vec<String>,

    /// Whether any JSON-LD block declares a Product
    pub has_product_schema: bool,
}

/// Parses HTML content and extracts links and structured data
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `href` of `<a>` and `<link>` tags
/// - `content` of `<meta>` tags whose `property` mentions `og:url` (any case)
/// - `url` of JSON-LD objects typed `Product`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to an http(s) URL
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
/// * `strip_query` - Whether normalized links drop their query string
///
/// # Example
///
/// ```
/// use sumi_shelf::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, true);
/// assert_eq!(parsed.links, vec!["https://example.com/page"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url, strip_query: bool) -> ParsedPage {
    let document = Html::parse_document(html);
    let blocks = structured_data(&document);

    let has_product_schema = blocks.iter().any(StructuredData::has_product);
    let links = extract_links(&document, &blocks, base_url, strip_query);

    ParsedPage {
        links,
        has_product_schema,
    }
}

/// Returns true if any JSON-LD block (or list element) declares a Product
pub fn has_product_schema(html: &str) -> bool {
    let document = Html::parse_document(html);
    structured_data(&document)
        .iter()
        .any(StructuredData::has_product)
}

/// Collects every JSON-LD block in the document
fn structured_data(document: &Html) -> Vec<StructuredData> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| StructuredData::parse(&element.text().collect::<String>()))
        .collect()
}

/// Extracts all valid links from the HTML document
fn extract_links(
    document: &Html,
    blocks: &[StructuredData],
    base_url: &Url,
    strip_query: bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |href: &str| {
        if let Some(link) = resolve_link(href, base_url, strip_query) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    };

    // Anchor and link tags
    if let Ok(href_selector) = Selector::parse("a[href], link[href]") {
        for element in document.select(&href_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    // og:url meta tags
    if let Ok(meta_selector) = Selector::parse("meta[property][content]") {
        for element in document.select(&meta_selector) {
            let is_og_url = element
                .value()
                .attr("property")
                .is_some_and(|p| p.to_ascii_lowercase().contains("og:url"));
            if is_og_url {
                if let Some(content) = element.value().attr("content") {
                    push(content);
                }
            }
        }
    }

    // Product JSON-LD
    for block in blocks {
        for url in block.product_urls() {
            push(url);
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url, strip_query: bool) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str(), strip_query)
        .ok()
        .map(|url| url.to_string())
}
