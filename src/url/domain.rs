use url::{Host, Url};

/// Returns the registered domain (eTLD+1) of a URL's host
///
/// The public suffix list decides where the registrable part starts, so
/// `shop.example.co.uk` maps to `example.co.uk`. IP addresses and hosts
/// without a known suffix (e.g. `localhost`) map to themselves.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_shelf::url::registered_domain;
///
/// let url = Url::parse("https://www.shop.example.co.uk/p/1").unwrap();
/// assert_eq!(registered_domain(&url), Some("example.co.uk".to_string()));
/// ```
pub fn registered_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => Some(registered_domain_of_host(domain)),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

/// Returns the registered domain of a bare host name
///
/// A `host:port` pair is accepted; the port is ignored.
pub fn registered_domain_of_host(host: &str) -> String {
    let host = host
        .rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(host, |(name, _)| name)
        .trim_end_matches('.')
        .to_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    match psl::domain_str(&host) {
        Some(domain) => domain.to_string(),
        None => host,
    }
}
