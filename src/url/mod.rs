//! URL handling module for Sumi-Shelf
//!
//! This module provides URL normalization, registered-domain extraction,
//! crawl scope checks and static-resource filtering.

mod domain;
mod normalize;

use std::collections::BTreeSet;
use url::Url;

// Re-export main functions
pub use domain::{registered_domain, registered_domain_of_host};
pub use normalize::normalize_url;

/// The set of registered domains a crawl is allowed to visit
///
/// Built from the seed domains; a URL is in scope when its registered domain
/// equals one of the seeds' registered domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlScope {
    registered: BTreeSet<String>,
}

impl CrawlScope {
    /// Builds a scope from seed host names (e.g. `www.example.com`)
    pub fn from_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            registered: seeds
                .into_iter()
                .map(|seed| registered_domain_of_host(seed.as_ref()))
                .collect(),
        }
    }

    /// Returns the registered domain of `url` if it lies within the scope
    pub fn registered_domain_of(&self, url: &Url) -> Option<String> {
        registered_domain(url).filter(|domain| self.registered.contains(domain))
    }

    /// Returns true if `url` belongs to one of the seed sites
    pub fn contains(&self, url: &Url) -> bool {
        self.registered_domain_of(url).is_some()
    }

    /// Iterates over the registered domains in this scope
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }
}

/// Returns true if the URL path ends in one of the given static extensions
///
/// Extensions are compared case-insensitively and may be given with or
/// without the leading dot. The query string is never considered.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_shelf::url::is_static_resource;
///
/// let exts = vec!["png".to_string(), ".pdf".to_string()];
/// let url = Url::parse("https://example.com/img/logo.PNG?v=2").unwrap();
/// assert!(is_static_resource(&url, &exts));
/// ```
pub fn is_static_resource(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_lowercase();
    extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_lowercase();
        !ext.is_empty()
            && path
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn exts() -> Vec<String> {
        ["png", "jpg", ".gz", "pdf"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scope_contains_subdomains() {
        let scope = CrawlScope::from_seeds(["www.example.com"]);
        assert!(scope.contains(&url("https://example.com/")));
        assert!(scope.contains(&url("https://shop.example.com/p/1")));
        assert!(!scope.contains(&url("https://external.com/x")));
    }

    #[test]
    fn test_scope_registered_domain_of() {
        let scope = CrawlScope::from_seeds(["example.com", "shop.example.org"]);
        assert_eq!(
            scope.registered_domain_of(&url("https://a.example.org/")),
            Some("example.org".to_string())
        );
        assert_eq!(scope.registered_domain_of(&url("https://example.net/")), None);
        assert_eq!(scope.domains().count(), 2);
    }

    #[test]
    fn test_scope_does_not_match_suffix_lookalikes() {
        let scope = CrawlScope::from_seeds(["example.com"]);
        assert!(!scope.contains(&url("https://notexample.com/")));
    }

    #[test]
    fn test_static_resource_detection() {
        assert!(is_static_resource(&url("https://example.com/logo.png"), &exts()));
        assert!(is_static_resource(&url("https://example.com/a/B.JPG"), &exts()));
        assert!(is_static_resource(&url("https://example.com/s.xml.gz"), &exts()));
        assert!(!is_static_resource(&url("https://example.com/products/png"), &exts()));
        assert!(!is_static_resource(&url("https://example.com/p/1?f=a.png"), &exts()));
        assert!(!is_static_resource(&url("https://example.com/"), &exts()));
    }
}
