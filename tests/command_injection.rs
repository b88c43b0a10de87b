//! Command injection routes driven through the full router.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{post_json, send, TestLab};

#[tokio::test]
async fn test_vulnerable_exec_runs_chained_commands() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/vulnerable/exec", json!({ "command": "echo first; echo second" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["stdout"], "first\nsecond\n");
    assert_eq!(body["returncode"], 0);
    assert_eq!(body["command"], "echo first; echo second");
}

#[tokio::test]
async fn test_subprocess_safe_passes_metacharacters_as_arguments() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/secure/subprocess_safe", json!({ "command": "echo first; echo second" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["stdout"], "first; echo second\n");
}

#[tokio::test]
async fn test_whitelist_refuses_unknown_command() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/secure/whitelist", json!({ "command": "cat /etc/passwd" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json()["error"],
        "Command not allowed. Allowed commands: ls, ping, whoami"
    );
}

#[tokio::test]
async fn test_escape_shell_echoes_payload_literally() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/secure/escape_shell", json!({ "command": "x; id" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["original_command"], "x; id");
    assert_eq!(body["stdout"], "x; id\n");
    assert!(body.get("command").is_none());
}

#[tokio::test]
async fn test_length_and_blacklist_rejections() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let long = "echo aaaaaaaaaaaaaaaaaaaaaaaaa";
    let res = send(&router, post_json("/cmdi/secure/length_restriction", json!({ "command": long }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&router, post_json("/cmdi/secure/blacklist_keywords", json!({ "command": "ls && id" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].as_str().unwrap().starts_with("Input contains blacklisted keyword"));
}

#[tokio::test]
async fn test_blank_command_is_a_validation_error() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/vulnerable/exec", json!({ "command": "   " }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["fields"]["command"][0], "blank: Command cannot be empty");
}

#[tokio::test]
async fn test_command_mapping_rejects_free_text() {
    let lab = TestLab::new();
    let router = lab.router().await;

    let res = send(&router, post_json("/cmdi/secure/command_mapping", json!({ "command_type": "rm" }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&router, post_json("/cmdi/secure/command_mapping", json!({ "command_type": "whoami" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["command"], "whoami");
}
