//! Product page classification

use crate::config::FilterConfig;
use crate::ConfigError;
use regex::Regex;

/// Why a page was classified as a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSignal {
    /// The URL matched a product pattern
    UrlPattern,
    /// The page declared a schema.org Product
    Schema,
    /// Both of the above
    Both,
}

/// Decides whether a URL or page is a product listing
#[derive(Debug, Clone)]
pub struct ProductClassifier {
    patterns: Vec<Regex>,
}

impl ProductClassifier {
    /// Compiles the given patterns
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn from_config(filters: &FilterConfig) -> Result<Self, ConfigError> {
        Self::new(&filters.product_patterns)
    }

    /// True if the URL matches any product pattern
    pub fn is_product_url(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }

    /// Combines the URL check with the page's structured-data verdict
    pub fn classify(&self, url: &str, has_product_schema: bool) -> Option<ProductSignal> {
        match (self.is_product_url(url), has_product_schema) {
            (true, true) => Some(ProductSignal::Both),
            (true, false) => Some(ProductSignal::UrlPattern),
            (false, true) => Some(ProductSignal::Schema),
            (false, false) => None,
        }
    }
}
