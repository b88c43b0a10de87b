//! Error taxonomy shared by every lab module.
//!
//! Handlers return `Result<_, LabError>`; the `IntoResponse` impl maps each
//! variant onto its status code and a `{"error": ...}` body. Modules with
//! their own envelope (sqli, upload) match on the variant instead.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::mitigation::Rejection;

/// Errors a lab handler can produce.
#[derive(Debug, Error)]
pub enum LabError {
    /// Field-level constraint violations.
    #[error("Validation failed: {}", summarize(.0))]
    Validation(#[from] validator::ValidationErrors),

    /// Body could not be parsed at all.
    #[error("{0}")]
    Malformed(String),

    /// A mitigation strategy refused the input.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Credentials missing or wrong.
    #[error("Authentication required")]
    Unauthorized { realm: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The dangerous primitive failed; the raw message is surfaced.
    #[error("{0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LabError {
    pub fn status(&self) -> StatusCode {
        match self {
            LabError::Validation(_) | LabError::Malformed(_) | LabError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            LabError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            LabError::Forbidden(_) => StatusCode::FORBIDDEN,
            LabError::NotFound(_) => StatusCode::NOT_FOUND,
            LabError::Execution(_) | LabError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field name → list of `"<code>: <message>"` entries.
    pub fn fields(&self) -> Option<BTreeMap<String, Vec<String>>> {
        match self {
            LabError::Validation(errors) => Some(field_messages(errors)),
            _ => None,
        }
    }
}

/// Flatten validation errors into a stable, serializable map.
pub fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => format!("{}: {}", e.code, message),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn summarize(errors: &validator::ValidationErrors) -> String {
    field_messages(errors)
        .into_iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<PathRejection> for LabError {
    fn from(rejection: PathRejection) -> Self {
        LabError::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for LabError {
    fn from(rejection: QueryRejection) -> Self {
        LabError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for LabError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "error": self.to_string() });
        if let Some(fields) = self.fields() {
            body["fields"] = json!(fields);
        }

        let mut response = (status, Json(body)).into_response();
        if let LabError::Unauthorized { realm } = &self {
            if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}
