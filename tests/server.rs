//! Server-level behavior: index, health, fallback, request IDs and shutdown.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mitigation_lab::http::X_REQUEST_ID;
use mitigation_lab::LabServer;

mod common;

use common::{get, send, TestLab};

#[tokio::test]
async fn test_index_lists_every_module() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/")).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["name"], "mitigation-lab");
    let names: Vec<&str> = body["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["cmdi", "idor", "upload", "lfi", "sqli", "ssrf", "xss", "xxe"]);
}

#[tokio::test]
async fn test_health_and_fallback() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/health")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "ok");

    let res = send(&router, get("/nowhere")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "No route for /nowhere");
}

#[tokio::test]
async fn test_request_id_is_generated_or_propagated() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/health")).await;
    let generated = res.headers[&X_REQUEST_ID].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let request = Request::builder()
        .uri("/health")
        .header(&X_REQUEST_ID, "client-chosen")
        .body(Body::empty())
        .unwrap();
    let res = send(&router, request).await;
    assert_eq!(res.headers[&X_REQUEST_ID], "client-chosen");
}

#[tokio::test]
async fn test_body_limit_applies_to_json_routes() {
    let mut lab = TestLab::new();
    lab.config.security.max_body_size = 64;
    lab.config.upload.max_file_size = 64;
    let router = lab.router().await;

    let body = serde_json::json!({ "command": "a".repeat(256) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/cmdi/vulnerable/exec")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let res = send(&router, request).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_serve_and_graceful_shutdown() {
    let lab = TestLab::new();
    let server = LabServer::new(lab.config.clone()).await.unwrap();
    let shutdown = server.shutdown_handle();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.run(listener));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
