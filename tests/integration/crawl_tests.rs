//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use sitemapper::config::Config;
use sitemapper::crawler::run_crawl;
use sitemapper::{CrawlError, Crawler, Link, LinkKind, StopReason};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration tuned for fast tests
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.workers = 4;
    config.crawler.read_timeout_ms = 1000;
    config.crawler.execution_timeout_secs = 10;
    config.crawler.idle_threshold_ms = 100;
    config.crawler.poll_interval_ms = 10;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/page1">Page 1</a>
           <a href="/page2">Page 2</a>
           <img src="/logo.png">"#,
    )
    .await;
    mount_page(&server, "/page1", r#"<a href="/page2">Again</a><a href="/">Home</a>"#).await;
    mount_page(&server, "/page2", r#"<a href="page3">Relative</a>"#).await;
    mount_page(&server, "/page3", "<p>No links here</p>").await;

    let seed = format!("{}/", base);
    let site_map = run_crawl(&seed, &create_test_config()).await.unwrap();

    assert_eq!(
        site_map.sorted_urls(),
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page3", base),
        ]
    );
    assert_eq!(
        site_map.links(&seed).unwrap(),
        &[
            Link::hyperlink(format!("{}/page1", base)),
            Link::hyperlink(format!("{}/page2", base)),
            Link::embedded(format!("{}/logo.png", base)),
        ]
    );
    assert!(site_map.links(&format!("{}/page3", base)).unwrap().is_empty());
    assert!(site_map.failures().is_empty());

    // Embedded resources are recorded but never fetched
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/logo.png"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_external_links_recorded_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="http://external.invalid/page">Elsewhere</a>
           <a href="mailto:team@example.com">Mail</a>
           <a href="/inside">Inside</a>"#,
    )
    .await;
    mount_page(&server, "/inside", "").await;

    let seed = format!("{}/", base);
    let site_map = run_crawl(&seed, &create_test_config()).await.unwrap();

    assert_eq!(site_map.len(), 2);
    assert!(!site_map.contains("http://external.invalid/page"));
    assert!(site_map.failures().is_empty());

    let links = site_map.links(&seed).unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].target, "http://external.invalid/page");
    assert_eq!(links[1].target, "mailto:team@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_pages_recorded_as_failures() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/error">Error</a><a href="/ok">OK</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "").await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let site_map = run_crawl(&format!("{}/", base), &create_test_config())
        .await
        .unwrap();

    assert_eq!(site_map.len(), 2);
    let failures = site_map.failures();
    assert!(failures[&format!("{}/missing", base)].contains("404"));
    assert!(failures[&format!("{}/error", base)].contains("500"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_non_html_document_has_no_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/data.json">Data</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"href": "<a href=\"/hidden\">"}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let site_map = run_crawl(&format!("{}/", base), &create_test_config())
        .await
        .unwrap();

    assert_eq!(site_map.len(), 2);
    assert!(site_map
        .links(&format!("{}/data.json", base))
        .unwrap()
        .is_empty());
    assert!(!site_map.contains(&format!("{}/hidden", base)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_redirect_resolves_against_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(&server, "/new/", r#"<a href="child">Child</a>"#).await;
    mount_page(&server, "/new/child", "").await;

    let site_map = run_crawl(&format!("{}/", base), &create_test_config())
        .await
        .unwrap();

    // The redirected page is keyed by the URL that was admitted
    let old_links = site_map.links(&format!("{}/old", base)).unwrap();
    assert_eq!(old_links, &[Link::hyperlink(format!("{}/new/child", base))]);
    assert!(site_map.contains(&format!("{}/new/child", base)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(r#"<a href="/never">Never</a>"#).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.read_timeout_ms = 100;

    let site_map = run_crawl(&format!("{}/", base), &config).await.unwrap();

    assert_eq!(site_map.len(), 1);
    assert!(site_map.failures()[&format!("{}/slow", base)].contains("timeout"));
    assert!(!site_map.contains(&format!("{}/never", base)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scope_allow_list_extends_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = server.address().port();

    // Same server reached under a second host name
    mount_page(
        &server,
        "/",
        &format!(r#"<a href="http://localhost:{}/alias">Alias</a>"#, port),
    )
    .await;
    mount_page(&server, "/alias", "").await;

    let mut config = create_test_config();
    config.scope.allow = vec!["localhost".to_string()];

    let site_map = run_crawl(&format!("{}/", base), &config).await.unwrap();
    assert!(site_map.contains(&format!("http://localhost:{}/alias", port)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scope_deny_list_blocks_path() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/next">Next</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.scope.deny = vec!["127.0.0.1".to_string()];

    // The seed is always fetched, its links are still filtered
    let site_map = run_crawl(&format!("{}/", base), &config).await.unwrap();
    assert_eq!(site_map.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_terminates_http_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .respond_with(html("").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.read_timeout_ms = 5000;

    let seed = url::Url::parse(&format!("{}/", base)).unwrap();
    let crawler = Crawler::for_site(&seed, &config).unwrap();
    let stop = crawler.stop_handle();

    let crawl = tokio::spawn(async move { crawler.crawl(seed.as_str()).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    stop.request_stop();

    let result = tokio::time::timeout(Duration::from_secs(1), crawl)
        .await
        .expect("crawl should stop within a second")
        .unwrap();
    assert!(matches!(
        result,
        Err(CrawlError::Terminated {
            reason: StopReason::Requested
        })
    ));
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let result = run_crawl("not a url", &create_test_config()).await;
    assert!(matches!(result, Err(CrawlError::Url(_))));
}

#[test]
fn test_link_kind_display() {
    assert_eq!(LinkKind::Hyperlink.to_string(), "a");
    assert_eq!(LinkKind::EmbeddedResource.to_string(), "img");
}
