//! Server-level responses: the module index, health and unknown routes.

use axum::{http::Uri, Json};
use serde::Serialize;

use crate::error::LabError;

/// One entry of the index.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub prefix: &'static str,
    pub description: &'static str,
}

pub const MODULES: [ModuleInfo; 8] = [
    ModuleInfo { name: "cmdi", prefix: "/cmdi", description: "OS command injection" },
    ModuleInfo { name: "idor", prefix: "/idor", description: "Insecure direct object reference" },
    ModuleInfo { name: "upload", prefix: "/upload", description: "Insecure file upload" },
    ModuleInfo { name: "lfi", prefix: "/lfi", description: "Local file inclusion" },
    ModuleInfo { name: "sqli", prefix: "/sqli", description: "SQL injection" },
    ModuleInfo { name: "ssrf", prefix: "/ssrf", description: "Server-side request forgery" },
    ModuleInfo { name: "xss", prefix: "/xss", description: "Cross-site scripting" },
    ModuleInfo { name: "xxe", prefix: "/xxe", description: "XML external entities" },
];

/// `GET /`
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "modules": MODULES,
    }))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> LabError {
    LabError::NotFound(format!("No route for {}", uri.path()))
}
