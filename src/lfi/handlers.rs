//! HTTP handlers for the file inclusion routes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde_json::{json, Value};

use crate::lfi::guards::{FileGuard, GuardContext};
use crate::lfi::models::{FileQuery, FileResponse, ProtectionMethod};
use crate::lfi::primitive;
use crate::observability::metrics::{record_outcome, Outcome};

const MODULE: &str = "lfi";

#[derive(Debug)]
pub struct LfiState {
    pub ctx: GuardContext,
    pub guards: HashMap<ProtectionMethod, Box<dyn FileGuard>>,
}

impl LfiState {
    /// Check and read `requested` through the guard registered for `method`.
    pub fn read(&self, method: ProtectionMethod, requested: &str) -> (ProtectionMethod, Result<String, String>) {
        let Some(guard) = self.guards.get(&method) else {
            return (method, Err("Protection method not configured".to_string()));
        };
        let used = guard.method();
        let result = guard.check(&self.ctx, requested).and_then(|path| {
            if guard.limits_reads() {
                primitive::read_limited(&path, self.ctx.max_file_size)
            } else {
                primitive::read_unchecked(&path)
            }
        });
        (used, result)
    }
}

fn method_names() -> Vec<&'static str> {
    ProtectionMethod::ALL.iter().map(|m| m.as_str()).collect()
}

/// `GET /`
pub async fn index() -> Html<String> {
    Html(format!(
        "<h1>LFI Protection Demo API</h1>\n\
         <p>Endpoints:</p>\n\
         <ul>\n\
         <li><b>/vulnerable/lfi?file=</b> - Vulnerable endpoint with no protection</li>\n\
         <li><b>/protected/lfi?file=&method=</b> - Protected endpoint with various methods</li>\n\
         </ul>\n\
         <p>Available protection methods: {}</p>\n",
        method_names().join(", ")
    ))
}

/// `GET /vulnerable/lfi?file=`
pub async fn vulnerable(
    State(state): State<Arc<LfiState>>,
    Query(query): Query<FileQuery>,
) -> (StatusCode, Json<Value>) {
    let Some(file) = query.file.filter(|f| !f.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "File parameter is required" })),
        );
    };

    let (_, result) = blocking_read(state, ProtectionMethod::Vulnerable, file.clone()).await;
    match result {
        Ok(content) => {
            tracing::info!(file = %file, "Unchecked file read");
            record_outcome(MODULE, "vulnerable", Outcome::Allowed);
            (StatusCode::OK, Json(json!({ "content": content })))
        }
        Err(error) => {
            record_outcome(MODULE, "vulnerable", Outcome::Failed);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": error })))
        }
    }
}

/// `GET /protected/lfi?file=&method=`
pub async fn protected(
    State(state): State<Arc<LfiState>>,
    Query(query): Query<FileQuery>,
) -> (StatusCode, Json<FileResponse>) {
    let method_param = query
        .method
        .unwrap_or_else(|| ProtectionMethod::Vulnerable.as_str().to_string());

    let Some(file) = query.file.filter(|f| !f.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(FileResponse::failure(method_param, "File parameter is required")),
        );
    };

    let Some(method) = ProtectionMethod::parse(&method_param) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(FileResponse::failure(
                method_param,
                format!("Invalid protection method. Available: {:?}", method_names()),
            )),
        );
    };

    let (used, result) = blocking_read(state, method, file.clone()).await;
    match result {
        Ok(content) => {
            record_outcome(MODULE, method.as_str(), Outcome::Allowed);
            (
                StatusCode::OK,
                Json(FileResponse {
                    success: true,
                    content: Some(content),
                    error: None,
                    protection_method: used.as_str().to_string(),
                }),
            )
        }
        Err(error) => {
            tracing::warn!(method = method.as_str(), file = %file, error = %error, "File read refused");
            record_outcome(MODULE, method.as_str(), Outcome::Rejected);
            (
                StatusCode::BAD_REQUEST,
                Json(FileResponse::failure(used.as_str(), error)),
            )
        }
    }
}

/// Guards and reads touch the filesystem synchronously.
async fn blocking_read(
    state: Arc<LfiState>,
    method: ProtectionMethod,
    file: String,
) -> (ProtectionMethod, Result<String, String>) {
    tokio::task::spawn_blocking(move || state.read(method, &file))
        .await
        .unwrap_or_else(|e| (method, Err(e.to_string())))
}
