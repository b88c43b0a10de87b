//! HTTP handlers for the XXE routes.

use std::collections::HashSet;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    Json,
};

use crate::error::LabError;
use crate::mitigation::validation::ValidJson;
use crate::mitigation::Rejection;
use crate::observability::metrics::{record_outcome, Outcome};
use crate::upload::models::UploadForm;
use crate::upload::primitive;
use crate::xxe::mitigations::{self, XmlError};
use crate::xxe::models::{MessageResponse, UserProfile, UsernameResponse, XmlStrategy};

const MODULE: &str = "xxe";

#[derive(Debug)]
pub struct XxeState {
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub allowed_tags: HashSet<String>,
}

/// `GET /`
pub async fn index() -> &'static str {
    "XXE Demo API - Check /insecure and /secure endpoints"
}

fn require_xml(headers: &HeaderMap) -> Result<(), LabError> {
    let essence = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim);
    match essence {
        Some(mime) if mime.eq_ignore_ascii_case("application/xml") => Ok(()),
        _ => Err(LabError::Malformed("Content-Type must be application/xml".to_string())),
    }
}

/// Parse the body with `strategy` and return the username.
pub async fn parse(
    State(state): State<Arc<XxeState>>,
    strategy: XmlStrategy,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, LabError> {
    require_xml(&headers)?;
    let xml = String::from_utf8(body.to_vec())
        .map_err(|_| LabError::Malformed("Body is not valid UTF-8".to_string()))?;

    let allowed_tags = state.allowed_tags.clone();
    let result = tokio::task::spawn_blocking(move || {
        if strategy == XmlStrategy::CustomParser {
            mitigations::extract_profile(&xml).map(|profile| serde_json::json!(profile))
        } else {
            mitigations::parse_username(strategy, &xml, &allowed_tags)
                .map(|username| serde_json::json!(UsernameResponse { username }))
        }
    })
    .await
    .map_err(|e| LabError::Execution(e.to_string()))?;

    match result {
        Ok(body) => {
            record_outcome(MODULE, strategy.as_str(), Outcome::Allowed);
            Ok(Json(body))
        }
        Err(e) => Err(refuse(strategy, e)),
    }
}

fn refuse(strategy: XmlStrategy, error: XmlError) -> LabError {
    let error = error.into_lab_error(strategy);
    match &error {
        LabError::Rejected(rejection) => {
            tracing::warn!(strategy = strategy.as_str(), reason = %rejection.reason, "XML refused");
            record_outcome(MODULE, strategy.as_str(), Outcome::Rejected);
        }
        other => {
            tracing::info!(strategy = strategy.as_str(), error = %other, "XML could not be processed");
            record_outcome(MODULE, strategy.as_str(), Outcome::Failed);
        }
    }
    error
}

/// `POST /secure/json_to_xml`
pub async fn json_to_xml(
    ValidJson(profile): ValidJson<UserProfile>,
) -> Result<Json<UsernameResponse>, LabError> {
    let xml = mitigations::profile_to_xml(&profile);
    let doc = roxmltree::Document::parse(&xml)
        .map_err(|e| LabError::Execution(format!("Generated XML is invalid: {}", e)))?;
    let username = mitigations::username(&doc).map_err(|e| LabError::Execution(e.to_string()))?;

    record_outcome(MODULE, "json_to_xml", Outcome::Allowed);
    Ok(Json(UsernameResponse { username }))
}

async fn uploaded_file(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), LabError> {
    let multipart = multipart.map_err(|e| LabError::Malformed(e.body_text()))?;
    let form = UploadForm::read(multipart)
        .await
        .map_err(|e| LabError::Malformed(e.body_text()))?;
    let part = form
        .file()
        .ok_or_else(|| LabError::Malformed("No file provided".to_string()))?;
    match part.file_name.as_deref() {
        Some(name) if !name.is_empty() => Ok((name.to_string(), part.data.clone())),
        _ => Err(LabError::Malformed("No selected file".to_string())),
    }
}

/// `POST /insecure/upload` stores the file under the client's name.
pub async fn insecure_upload(
    State(state): State<Arc<XxeState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, LabError> {
    let (filename, data) = uploaded_file(multipart).await?;
    let stored = primitive::store(&state.upload_dir, &filename, &data).await?;

    tracing::info!(path = %stored.path.display(), size = stored.size, "Stored XML upload");
    record_outcome(MODULE, "insecure_upload", Outcome::Allowed);
    Ok(Json(MessageResponse {
        message: "File uploaded".to_string(),
    }))
}

/// `POST /secure/sandbox_upload` stores by basename after an extension check.
pub async fn sandbox_upload(
    State(state): State<Arc<XxeState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, LabError> {
    let (filename, data) = uploaded_file(multipart).await?;

    let basename = FsPath::new(&filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|name| {
            name.rsplit_once('.').is_some_and(|(_, ext)| {
                state.allowed_extensions.contains(&ext.to_ascii_lowercase())
            })
        });
    let Some(basename) = basename else {
        tracing::warn!(filename = %filename, "Upload refused: invalid file type");
        record_outcome(MODULE, "sandbox_upload", Outcome::Rejected);
        return Err(Rejection::new("sandbox_upload", "Invalid file type").into());
    };

    let stored = primitive::store(&state.upload_dir, basename, &data).await?;
    tracing::info!(path = %stored.path.display(), size = stored.size, "Stored XML upload");
    record_outcome(MODULE, "sandbox_upload", Outcome::Allowed);
    Ok(Json(MessageResponse {
        message: "File uploaded safely".to_string(),
    }))
}
