//! HTTP fetching and a whole crawl against wiremock servers

use crate::support::test_config;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use sumi_shelf::config::UserAgentConfig;
use sumi_shelf::crawler::{crawl_with, ContentKind, Fetcher, HttpFetcher};
use sumi_shelf::output::{file_name_for, TextFileSink};
use sumi_shelf::FetchError;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn test_agent() -> UserAgentConfig {
    UserAgentConfig {
        override_string: Some("TestBot/1.0".to_string()),
        ..UserAgentConfig::default()
    }
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::from_config(&test_agent(), &BTreeMap::new()).unwrap()
}

#[tokio::test]
async fn test_fetch_reports_status_type_and_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<html>hello</html>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/page", mock_server.uri());
    let response = fetcher().get(&url, TIMEOUT).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_kind(), ContentKind::Html);
    assert_eq!(response.text(), "<html>hello</html>");
    assert_eq!(response.url, url);
}

#[tokio::test]
async fn test_non_200_is_a_response_not_an_error() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/missing", mock_server.uri());

    let response = fetcher().get(&url, TIMEOUT).await.unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<html>moved</html>"))
        .mount(&mock_server)
        .await;

    let response = fetcher()
        .get(&format!("{}/old", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.url, format!("{}/new", mock_server.uri()));
}

#[tokio::test]
async fn test_agent_and_extra_headers_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("x-shelf-test", "yes"))
        .respond_with(html("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("X-Shelf-Test".to_string(), "yes".to_string());
    let fetcher = HttpFetcher::from_config(&test_agent(), &headers).unwrap();

    let response = fetcher
        .get(&format!("{}/headers", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let result = fetcher()
        .get(
            &format!("{}/slow", mock_server.uri()),
            Duration::from_millis(200),
        )
        .await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_refused_connection_is_connect_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = fetcher()
        .get(&format!("http://127.0.0.1:{}/", port), TIMEOUT)
        .await;

    assert!(matches!(result, Err(FetchError::Connect { .. })));
}

#[tokio::test]
async fn test_crawl_against_mock_server() {
    let mock_server = MockServer::start().await;
    let domain = format!("127.0.0.1:{}", mock_server.address().port());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/product/1">Widget</a>
                <a href="/about">About</a>
                <img src="/logo.png"><a href="/logo.png">Logo</a>
                <a href="http://other.test/x">Elsewhere</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(html("<html><body>Widget</body></html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<html><body>About</body></html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&domain);
    config.user_agent = test_agent();
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.headers).unwrap();

    let dir = TempDir::new().unwrap();
    let sink = TextFileSink::new(dir.path());
    let reports = crawl_with(&config, Arc::new(fetcher), &sink).await.unwrap();

    let product = format!("http://{}/product/1", domain);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].products, vec![product.clone()]);
    assert!(reports[0]
        .visited
        .contains(&format!("http://{}/about", domain)));

    let saved = std::fs::read_to_string(dir.path().join(file_name_for(&domain))).unwrap();
    assert_eq!(saved, format!("{}\n", product));
}
