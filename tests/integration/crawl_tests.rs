//! End-to-end crawls against an in-memory site
//!
//! These tests drive a full coordinator (bootstrap, workers, shutdown)
//! through the `FakeSite` fetcher, so they cover scheme handling and
//! redirects without a network.

use crate::support::{test_config, FakeSite};
use std::sync::Arc;
use std::time::Duration;
use sumi_shelf::crawler::{crawl_with, Coordinator, StopReason};
use sumi_shelf::output::{file_name_for, TextFileSink};
use tempfile::TempDir;

const PRODUCT_JSON_LD: &str = r#"<script type="application/ld+json">
{"@context": "https://schema.org", "@type": "Product", "name": "Widget"}
</script>"#;

fn product_page(title: &str) -> String {
    format!(
        "<html><head><title>{}</title>{}</head><body></body></html>",
        title, PRODUCT_JSON_LD
    )
}

fn urlset(urls: &[&str]) -> String {
    let entries: String = urls
        .iter()
        .map(|url| format!("<url><loc>{}</loc></url>", url))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

/// robots.txt with a disallowed section, a sitemap, and a mixed link page
fn storefront() -> FakeSite {
    let home = r#"<html><body>
        <a href="/p/1">Widget</a>
        <a href="/admin/secret">Admin</a>
        <a href="https://external.com/x">Elsewhere</a>
    </body></html>"#;

    FakeSite::new()
        .text(
            "https://example.com/robots.txt",
            "User-agent: *\nDisallow: /admin\nCrawl-delay: 0\n",
        )
        .xml(
            "https://example.com/sitemap.xml",
            &urlset(&["https://example.com/p/1", "https://example.com/about"]),
        )
        .redirected_html("http://example.com/", "https://example.com/", home)
        .html("https://example.com/", home)
        .html("https://example.com/p/1", &product_page("Widget"))
        .html("https://example.com/about", "<html><body>About us</body></html>")
        .html("https://example.com/admin/secret", &product_page("Secret"))
        .html("https://external.com/x", &product_page("External"))
}

#[tokio::test]
async fn test_storefront_crawl() {
    let site = Arc::new(storefront());
    let report = Coordinator::with_fetcher(&test_config("example.com"), site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.products, vec!["https://example.com/p/1"]);
    assert_eq!(report.stop_reason, StopReason::Quiescent);

    for url in [
        "http://example.com/",
        "https://example.com/",
        "https://example.com/p/1",
        "https://example.com/about",
    ] {
        assert!(report.visited.contains(&url.to_string()), "{} not visited", url);
    }
    assert!(!report
        .visited
        .iter()
        .any(|url| url.contains("/admin") || url.contains("external.com")));

    assert!(!site.was_requested("https://example.com/admin/secret"));
    assert!(!site.was_requested("https://external.com/x"));
    assert!(report.stats.discarded("robots_denied") >= 1);
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let site = Arc::new(storefront());
    Coordinator::with_fetcher(&test_config("example.com"), site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    let requests = site.requests();
    let product_fetches = requests
        .iter()
        .filter(|url| *url == "https://example.com/p/1")
        .count();
    assert_eq!(product_fetches, 1);
}

#[tokio::test]
async fn test_sitemap_index_with_gzip_leaf() {
    let index = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.org/sitemap_pages.xml</loc></sitemap>
  <sitemap><loc>https://example.org/sitemap_products.xml.gz</loc></sitemap>
</sitemapindex>"#;

    let site = Arc::new(
        FakeSite::new()
            .text(
                "https://example.org/robots.txt",
                "User-agent: *\nAllow: /\n\nSitemap: https://example.org/sitemap_index.xml\n",
            )
            .xml("https://example.org/sitemap_index.xml", index)
            .xml(
                "https://example.org/sitemap_pages.xml",
                &urlset(&["https://example.org/about"]),
            )
            .gzip_xml(
                "https://example.org/sitemap_products.xml.gz",
                &urlset(&[
                    "https://example.org/product/1",
                    "https://example.org/product/2",
                ]),
            )
            .html("https://example.org/about", "<html><body>About</body></html>")
            .html("https://example.org/product/1", "<html><body>One</body></html>")
            .html("https://example.org/product/2", "<html><body>Two</body></html>"),
    );

    let report = Coordinator::with_fetcher(&test_config("example.org"), site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut products = report.products.clone();
    products.sort();
    assert_eq!(
        products,
        vec![
            "https://example.org/product/1",
            "https://example.org/product/2"
        ]
    );
    assert!(report
        .visited
        .contains(&"https://example.org/about".to_string()));
    assert_eq!(report.stats.sitemaps_expanded, 3);
    // The conventional location is only a fallback
    assert!(!site.was_requested("https://example.org/sitemap.xml"));
}

#[tokio::test]
async fn test_static_resources_never_fetched() {
    let site = Arc::new(
        FakeSite::new()
            .html(
                "https://example.com/",
                r#"<a href="/logo.png">logo</a><a href="/files/catalog.PDF">catalog</a><a href="/p/9">nine</a>"#,
            )
            .html("https://example.com/p/9", "<html></html>")
            .html("https://example.com/logo.png", "not really an image"),
    );

    let report = Coordinator::with_fetcher(&test_config("example.com"), site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(!site.was_requested("https://example.com/logo.png"));
    assert!(!site.was_requested("https://example.com/files/catalog.PDF"));
    assert_eq!(report.stats.discarded("static_resource"), 2);
    assert_eq!(report.products, vec!["https://example.com/p/9"]);
}

#[tokio::test]
async fn test_product_cap_is_honored() {
    let links: String = (1..=6)
        .map(|i| format!(r#"<a href="/p/{}">{}</a>"#, i, i))
        .collect();
    let mut site = FakeSite::new().html("https://example.com/", &links);
    for i in 1..=6 {
        site = site.html(
            &format!("https://example.com/p/{}", i),
            &product_page(&i.to_string()),
        );
    }

    let mut config = test_config("example.com");
    config.crawler.max_products = 2;

    let report = Coordinator::with_fetcher(&config, Arc::new(site))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.products.len(), 2);
}

#[tokio::test]
async fn test_root_disallowed_abandons_domain() {
    let site = Arc::new(
        FakeSite::new()
            .text("https://example.com/robots.txt", "User-agent: *\nDisallow: /\n")
            .html("https://example.com/", &product_page("Home"))
            .xml(
                "https://example.com/sitemap.xml",
                &urlset(&["https://example.com/p/1"]),
            ),
    );

    let report = Coordinator::with_fetcher(&test_config("example.com"), site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.products.is_empty());
    assert!(report.visited.is_empty());
    assert_eq!(site.requests(), vec!["https://example.com/robots.txt"]);
}

#[tokio::test]
async fn test_subdomains_share_scope() {
    let site = Arc::new(
        FakeSite::new()
            .html(
                "https://www.example.com/",
                r#"<a href="https://shop.example.com/product/7">seven</a>"#,
            )
            .html("https://shop.example.com/product/7", "<html></html>"),
    );

    let report = Coordinator::with_fetcher(&test_config("www.example.com"), site)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.products, vec!["https://shop.example.com/product/7"]);
}

#[tokio::test]
async fn test_requests_spaced_by_crawl_delay() {
    let home = r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#;
    let site = Arc::new(
        FakeSite::new()
            .redirected_html("http://example.com/", "https://example.com/", home)
            .html("https://example.com/", home)
            .html("https://example.com/a", "<html></html>")
            .html("https://example.com/b", "<html></html>")
            .html("https://example.com/c", "<html></html>"),
    );

    let mut config = test_config("example.com");
    config.crawler.default_crawl_delay_ms = 150;

    Coordinator::with_fetcher(&config, site.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut times = site.request_times(|url| {
        !url.ends_with("/robots.txt") && !url.ends_with("/sitemap.xml")
    });
    times.sort();
    assert_eq!(times.len(), 5);
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(gap >= Duration::from_millis(120), "requests only {:?} apart", gap);
    }
}

#[tokio::test]
async fn test_crawl_with_writes_one_file_per_domain() {
    let site = Arc::new(
        FakeSite::new()
            .html(
                "https://example.com/",
                r#"<a href="/products/kettle">kettle</a>"#,
            )
            .html("https://example.com/products/kettle", "<html></html>")
            .html("https://example.net/", r#"<a href="/item/42">42</a>"#)
            .html("https://example.net/item/42", "<html></html>")
            .status("https://example.net/missing", 404),
    );

    let dir = TempDir::new().unwrap();
    let sink = TextFileSink::new(dir.path());
    let mut config = test_config("example.com");
    config.domains.push("example.net".to_string());

    let reports = crawl_with(&config, site, &sink).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].domains, vec!["example.com"]);
    assert_eq!(reports[0].products, vec!["https://example.com/products/kettle"]);
    assert_eq!(reports[1].products, vec!["https://example.net/item/42"]);

    let com = std::fs::read_to_string(dir.path().join(file_name_for("example.com"))).unwrap();
    assert_eq!(com, "https://example.com/products/kettle\n");
    let net = std::fs::read_to_string(dir.path().join("example_net_urls.txt")).unwrap();
    assert_eq!(net, "https://example.net/item/42\n");
}

#[tokio::test]
async fn test_sitemap_query_product_under_default_config() {
    let site = Arc::new(
        FakeSite::new()
            .xml(
                "https://example.com/sitemap.xml",
                &urlset(&["https://example.com/view?id=5", "https://example.com/view-all"]),
            )
            .html("https://example.com/view", "<html><body>Kettle</body></html>")
            .html("https://example.com/view-all", "<html><body>All</body></html>"),
    );

    let report = Coordinator::with_fetcher(&test_config("example.com"), site)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.products, vec!["https://example.com/view"]);
}
