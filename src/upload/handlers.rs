//! HTTP handlers for the upload routes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::observability::metrics::{record_outcome, Outcome};
use crate::upload::mitigations::UploadPolicy;
use crate::upload::models::{FormPart, UploadCheck, UploadForm, UploadResponse};
use crate::upload::primitive;

const MODULE: &str = "upload";

#[derive(Debug)]
pub struct UploadState {
    pub policy: UploadPolicy,
    pub secure_dir: PathBuf,
    pub insecure_dir: PathBuf,
}

type Reply = (StatusCode, Json<UploadResponse>);

fn failure(status: StatusCode, message: impl Into<String>) -> Reply {
    (status, Json(UploadResponse::failure(message)))
}

async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> Result<UploadForm, Reply> {
    let multipart = multipart.map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))?;
    UploadForm::read(multipart)
        .await
        .map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))
}

/// The `file` part, or the reason there is none.
fn file_part(form: &UploadForm) -> Result<&FormPart, Reply> {
    let part = form
        .file()
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "No file part"))?;
    if part.file_name.as_deref().map_or(true, str::is_empty) {
        return Err(failure(StatusCode::BAD_REQUEST, "No selected file"));
    }
    Ok(part)
}

/// `POST /upload-insecure`
pub async fn upload_insecure(
    State(state): State<Arc<UploadState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(reply) => return reply,
    };
    let part = match file_part(&form) {
        Ok(part) => part,
        Err(reply) => return reply,
    };
    let filename = part.file_name.clone().unwrap_or_default();

    match primitive::store(&state.insecure_dir, &filename, &part.data).await {
        Ok(stored) => {
            tracing::info!(filename = %filename, path = %stored.path.display(), "File stored without validation");
            record_outcome(MODULE, "insecure", Outcome::Allowed);
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    message: "File uploaded successfully (insecurely)".to_string(),
                    filename: Some(filename),
                    filepath: Some(stored.path.display().to_string()),
                    filesize: Some(stored.size),
                    filetype: part.content_type.clone(),
                }),
            )
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "Failed to store upload");
            record_outcome(MODULE, "insecure", Outcome::Failed);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error saving file: {}", e),
            )
        }
    }
}

/// `POST /upload-secure/{check}` and `/upload-secure/comprehensive`
pub async fn upload_secure(
    state: Arc<UploadState>,
    label: &'static str,
    checks: &'static [UploadCheck],
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(reply) => return reply,
    };
    let part = match file_part(&form) {
        Ok(part) => part,
        Err(reply) => return reply,
    };

    let accepted = match state.policy.validate(&form, part, checks) {
        Ok(accepted) => accepted,
        Err(rejection) => {
            tracing::warn!(
                route = label,
                strategy = rejection.strategy,
                reason = %rejection.reason,
                "Upload rejected"
            );
            record_outcome(MODULE, label, Outcome::Rejected);
            return failure(
                StatusCode::BAD_REQUEST,
                format!("Secure upload failed: {}", rejection.reason),
            );
        }
    };

    match primitive::store(&state.secure_dir, &accepted.filename, &part.data).await {
        Ok(stored) => {
            record_outcome(MODULE, label, Outcome::Allowed);
            let applied: Vec<&str> = checks.iter().map(|c| c.as_str()).collect();
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    message: format!(
                        "File uploaded securely with validations: {}",
                        applied.join(", ")
                    ),
                    filename: Some(accepted.filename),
                    filepath: Some(stored.path.display().to_string()),
                    filesize: Some(stored.size),
                    filetype: Some(accepted.content_type),
                }),
            )
        }
        Err(e) => {
            tracing::error!(filename = %accepted.filename, error = %e, "Failed to store upload");
            record_outcome(MODULE, label, Outcome::Failed);
            failure(
                StatusCode::BAD_REQUEST,
                format!("Secure upload failed: {}", e),
            )
        }
    }
}

/// `GET /download/{*filename}`
pub async fn download(
    State(state): State<Arc<UploadState>>,
    Path(filename): Path<String>,
) -> Response {
    if filename.contains("..") || filename.starts_with('/') {
        tracing::warn!(filename = %filename, "Download path rejected");
        return failure(StatusCode::NOT_FOUND, "Download failed: Invalid filename").into_response();
    }

    match primitive::load(&state.secure_dir, &filename).await {
        Ok(data) => {
            let attachment_name = std::path::Path::new(&filename)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("download");
            let mut response = (StatusCode::OK, data).into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            if let Ok(value) =
                HeaderValue::from_str(&format!("attachment; filename=\"{}\"", attachment_name))
            {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(e) => failure(StatusCode::NOT_FOUND, format!("Download failed: {}", e)).into_response(),
    }
}
