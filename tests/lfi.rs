//! File inclusion routes driven through the full router.

use axum::http::StatusCode;

mod common;

use common::{get, send, TestLab};

#[tokio::test]
async fn test_vulnerable_reads_outside_allowed_dir() {
    let lab = TestLab::new();
    let router = lab.router().await;
    std::fs::write(lab.dir.path().join("lfi/secret.txt"), "top secret").unwrap();

    let res = send(&router, get("/lfi/vulnerable/lfi?file=allowed_files/../secret.txt")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["content"], "top secret");
}

#[tokio::test]
async fn test_missing_file_parameter() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/lfi/vulnerable/lfi")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "File parameter is required");

    let res = send(&router, get("/lfi/protected/lfi?method=allowlist")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["protection_method"], "allowlist");
}

#[tokio::test]
async fn test_protected_methods_serve_sample_file() {
    let lab = TestLab::new();
    let router = lab.router().await;

    for method in ["allowlist", "extension_check", "path_normalization", "symlink_check", "read_limit"] {
        let uri = format!("/lfi/protected/lfi?file=allowed_files/readme.txt&method={}", method);
        let res = send(&router, get(&uri)).await;
        assert_eq!(res.status, StatusCode::OK, "{}: {}", method, res.text());
        let body = res.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "This is a sample readme file.");
    }
}

#[tokio::test]
async fn test_read_limit_reports_normalization_guard() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/lfi/protected/lfi?file=allowed_files/readme.txt&method=read_limit")).await;
    assert_eq!(res.json()["protection_method"], "path_normalization");
}

#[tokio::test]
async fn test_protected_methods_refuse_traversal() {
    let lab = TestLab::new();
    let router = lab.router().await;
    std::fs::write(lab.dir.path().join("lfi/secret.txt"), "top secret").unwrap();

    for method in ["allowlist", "path_traversal_block", "path_normalization", "blacklist", "regex_validation"] {
        let uri = format!("/lfi/protected/lfi?file=allowed_files/../secret.txt&method={}", method);
        let res = send(&router, get(&uri)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} let traversal through", method);
        assert!(res.json().get("content").is_none());
    }
}

#[tokio::test]
async fn test_unknown_method() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, get("/lfi/protected/lfi?file=allowed_files/readme.txt&method=pray")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid protection method"));
}
