use crate::UrlError;
use url::Url;

/// Tracking query parameters removed when query strings are kept
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a URL string into the key used by the visited set and frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Require a host (the `url` crate already lowercases it)
/// 4. Remove the fragment
/// 5. Query string:
///    - `strip_query = true`: drop it entirely, so `?id=1` and `?id=2` collapse
///    - `strip_query = false`: drop tracking parameters and sort the rest
///
/// The scheme, host and path are kept as-is: `http://example.com/` and
/// `https://example.com/` are different keys.
///
/// # Examples
///
/// ```
/// use sumi_shelf::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/p/1?color=red#reviews", true).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/p/1");
///
/// let url = normalize_url("https://example.com/item?utm_source=x&id=7", false).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/item?id=7");
/// ```
pub fn normalize_url(url_str: &str, strip_query: bool) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url, strip_query)
}

fn normalize_parsed(mut url: Url, strip_query: bool) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if strip_query {
        url.set_query(None);
    } else if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = filtered_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
