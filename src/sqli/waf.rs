//! Request filter placed in front of the combined login route.
//!
//! Buffers the body, inspects every string value of a JSON object and
//! every query parameter, and answers 403 before the handler runs.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::observability::metrics::{record_outcome, Outcome};
use crate::observability::logging::SECURITY_TARGET;
use crate::sqli::handlers::SqliState;
use crate::sqli::models::LoginResponse;

/// Upper bound on the inspected body.
const MAX_INSPECTED_BODY: usize = 64 * 1024;

pub async fn waf(State(state): State<Arc<SqliState>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_INSPECTED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(LoginResponse::error("Request body too large")),
            )
                .into_response()
        }
    };

    let mut values: Vec<String> = Vec::new();
    if let Some(query) = parts.uri.query() {
        values.extend(
            url::form_urlencoded::parse(query.as_bytes()).map(|(_, v)| v.into_owned()),
        );
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(&bytes) {
        values.extend(map.into_iter().filter_map(|(_, v)| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }));
    }

    if let Some(hit) = values.iter().find(|v| state.policy.is_attack(v)) {
        tracing::warn!(
            target: SECURITY_TARGET,
            path = %parts.uri.path(),
            value = %hit,
            "Potential SQL injection detected"
        );
        record_outcome("sqli", "waf", Outcome::Rejected);
        return (
            StatusCode::FORBIDDEN,
            Json(LoginResponse::error("Potential SQL injection detected")),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
