//! SSRF routes against local mock backends.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{post_json, send, start_mock_backend, start_programmable_backend, TestLab};

#[tokio::test]
async fn test_vulnerable_fetches_loopback() {
    let lab = TestLab::new();
    let router = lab.router().await;
    let backend = start_mock_backend("internal admin panel").await;

    let url = format!("http://{}/admin", backend);
    let res = send(&router, post_json("/ssrf/vulnerable/ssrf", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["result"], "internal admin panel");
}

#[tokio::test]
async fn test_blocklist_and_ip_block_refuse_loopback() {
    let lab = TestLab::new();
    let router = lab.router().await;
    let backend = start_mock_backend("internal admin panel").await;
    let url = format!("http://{}/admin", backend);

    let res = send(&router, post_json("/ssrf/protected/blocklist", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Domain in blocklist");

    let res = send(&router, post_json("/ssrf/protected/ip-block", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: IP in blocklist");

    let res = send(&router, post_json("/ssrf/protected/domain-validation", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Private IP address");
}

#[tokio::test]
async fn test_allowlist_and_scheme_filter() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/ssrf/protected/allowlist", json!({ "url": "http://evil.test/" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Domain not in allowlist");

    let res = send(&router, post_json("/ssrf/protected/scheme-filter", json!({ "url": "file:///etc/passwd" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Scheme file not allowed");
}

#[tokio::test]
async fn test_method_restriction() {
    let lab = TestLab::new();
    let router = lab.router().await;
    let backend = start_mock_backend("pong").await;
    let url = format!("http://{}/", backend);

    let res = send(&router, post_json("/ssrf/protected/method-restriction", json!({ "url": url, "method": "POST" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Only GET method allowed");

    let res = send(&router, post_json("/ssrf/protected/method-restriction", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["result"], "pong");
}

#[tokio::test]
async fn test_header_sanitization_strips_credentials() {
    let lab = TestLab::new();
    let router = lab.router().await;
    // Echo the request head back to the caller.
    let backend = start_programmable_backend(|head| async move { (200, head) }).await;
    let url = format!("http://{}/", backend);
    let headers = json!({ "authorization": "Bearer secret", "X-Trace": "kept" });

    let res = send(&router, post_json("/ssrf/protected/header-sanitization", json!({ "url": url, "headers": headers }))).await;
    assert_eq!(res.status, StatusCode::OK);
    let echoed = res.json()["result"].as_str().unwrap().to_ascii_lowercase();
    assert!(!echoed.contains("bearer secret"));
    assert!(echoed.contains("x-trace: kept"));

    let res = send(&router, post_json("/ssrf/vulnerable/ssrf", json!({ "url": url, "headers": headers }))).await;
    let echoed = res.json()["result"].as_str().unwrap().to_ascii_lowercase();
    assert!(echoed.contains("bearer secret"));
}

#[tokio::test]
async fn test_timeout_route_gives_up_on_slow_target() {
    let lab = TestLab::new();
    let router = lab.router().await;
    let backend = start_programmable_backend(|_| async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "too late".to_string())
    })
    .await;
    let url = format!("http://{}/", backend);

    let res = send(&router, post_json("/ssrf/protected/timeout", json!({ "url": url }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Blocked: Request timeout");
}

#[tokio::test]
async fn test_empty_url_is_a_validation_error() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/ssrf/protected/blocklist", json!({ "url": " " }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["fields"]["url"].is_array());
}
