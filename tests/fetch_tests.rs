//! Integration tests for the rate-limited fetcher
//!
//! A wiremock server runs on a tokio runtime owned by each test while the
//! blocking fetcher is driven from plain test threads.

use mediacrawl::config::UserAgentConfig;
use mediacrawl::fetch::{build_http_client, Fetch, Fetcher, FetcherSettings};
use mediacrawl::FetchError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn fetcher(min_interval_ms: u64, retry_budget: u32) -> Fetcher {
    let settings = FetcherSettings {
        min_interval: Duration::from_millis(min_interval_ms),
        retry_budget,
        retry_backoff: Duration::from_millis(10),
    };
    Fetcher::new(build_http_client(&user_agent()).unwrap(), settings)
}

fn received(rt: &Runtime, server: &MockServer) -> usize {
    rt.block_on(server.received_requests())
        .map(|requests| requests.len())
        .unwrap_or(0)
}

#[test]
fn test_fetch_document() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/film/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"title":"x"}"#, "application/json"))
            .mount(&server),
    );

    let url = format!("{}/film/1.json", server.uri());
    let document = fetcher(0, 0)
        .fetch(&url, "test", Duration::from_secs(5))
        .unwrap();

    assert_eq!(document.status, 200);
    assert_eq!(document.body, r#"{"title":"x"}"#);
    assert!(document
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("json")));
}

#[test]
fn test_redirect_sets_final_url() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server),
    );

    let url = format!("{}/old", server.uri());
    let document = fetcher(0, 0)
        .fetch(&url, "test", Duration::from_secs(5))
        .unwrap();

    assert_eq!(document.url, url);
    assert_eq!(document.final_url, format!("{}/new", server.uri()));
    assert_eq!(document.text(), "moved");
}

#[test]
fn test_http_status_is_not_retried() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server),
    );

    let url = format!("{}/gone", server.uri());
    let result = fetcher(0, 3).fetch(&url, "test", Duration::from_secs(5));

    assert_eq!(result.unwrap_err(), FetchError::HttpStatus(404));
    assert_eq!(received(&rt, &server), 1);
}

#[test]
fn test_timeout_is_retried() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .up_to_n_times(1)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .mount(&server),
    );

    let url = format!("{}/slow", server.uri());
    let document = fetcher(0, 2)
        .fetch(&url, "test", Duration::from_millis(300))
        .unwrap();

    assert_eq!(document.text(), "finally");
    assert_eq!(received(&rt, &server), 2);
}

#[test]
fn test_retry_budget_is_bounded() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/stuck"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server),
    );

    let url = format!("{}/stuck", server.uri());
    let result = fetcher(0, 2).fetch(&url, "test", Duration::from_millis(200));

    assert_eq!(result.unwrap_err(), FetchError::Timeout);
    assert_eq!(received(&rt, &server), 3);
}

#[test]
fn test_requests_to_one_upstream_are_spaced() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server),
    );

    let fetcher = Arc::new(fetcher(100, 0));
    let started = Instant::now();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let fetcher = fetcher.clone();
            let url = format!("{}/page/{}", server.uri(), i);
            std::thread::spawn(move || fetcher.fetch(&url, "SR", Duration::from_secs(5)))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    // Five requests need at least four full intervals between them
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert_eq!(fetcher.rate_limiter().request_count("SR"), 5);
}

#[test]
fn test_unrelated_upstreams_do_not_wait_for_each_other() {
    let rt = Runtime::new().unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server),
    );

    let fetcher = Arc::new(fetcher(2_000, 0));
    let url = format!("{}/a", server.uri());

    // SR has just been used; ZDF must not inherit its wait
    fetcher.fetch(&url, "SR", Duration::from_secs(5)).unwrap();
    let started = Instant::now();
    fetcher.fetch(&url, "ZDF", Duration::from_secs(5)).unwrap();

    assert!(started.elapsed() < Duration::from_millis(1_500));
}
