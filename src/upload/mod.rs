//! Insecure file upload.
//!
//! `/upload-insecure` writes whatever arrives under the client's filename.
//! The secure routes share a baseline and add the check they are named
//! after; `comprehensive` applies all of them. Files accepted by a secure
//! route can be fetched back through `/download`.

pub mod handlers;
pub mod mitigations;
pub mod models;
pub mod primitive;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Router,
};

use crate::config::UploadConfig;

pub use handlers::UploadState;
pub use mitigations::UploadPolicy;
pub use models::{UploadCheck, UploadResponse};

/// Directories used by the upload routes, relative to `upload_dir`.
pub fn directories(config: &UploadConfig) -> (PathBuf, PathBuf) {
    let root = PathBuf::from(&config.upload_dir);
    (root.join("secure"), root.join("insecure"))
}

/// Build the `/upload` router. The directories must already exist.
pub fn router(config: &UploadConfig) -> Router {
    let (secure_dir, insecure_dir) = directories(config);
    let state = Arc::new(UploadState {
        policy: UploadPolicy::new(config),
        secure_dir,
        insecure_dir,
    });

    let mut router = Router::new()
        .route("/upload-insecure", post(handlers::upload_insecure))
        .route("/download/{*filename}", get(handlers::download));

    for check in UploadCheck::ALL {
        let checks: &'static [UploadCheck] = single_check(check);
        router = router.route(
            &format!("/upload-secure/{}", check.slug()),
            post(
                move |State(state): State<Arc<UploadState>>,
                      multipart: Result<Multipart, MultipartRejection>| {
                    handlers::upload_secure(state, check.as_str(), checks, multipart)
                },
            ),
        );
    }

    router
        .route(
            "/upload-secure/comprehensive",
            post(
                |State(state): State<Arc<UploadState>>,
                 multipart: Result<Multipart, MultipartRejection>| {
                    handlers::upload_secure(state, "comprehensive", &UploadCheck::ALL, multipart)
                },
            ),
        )
        // The size check must see oversized files instead of a 413.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

fn single_check(check: UploadCheck) -> &'static [UploadCheck] {
    match check {
        UploadCheck::MimeType => &[UploadCheck::MimeType],
        UploadCheck::Extension => &[UploadCheck::Extension],
        UploadCheck::MagicNumber => &[UploadCheck::MagicNumber],
        UploadCheck::SizeLimit => &[UploadCheck::SizeLimit],
        UploadCheck::RandomFilename => &[UploadCheck::RandomFilename],
        UploadCheck::MalwareScan => &[UploadCheck::MalwareScan],
        UploadCheck::SanitizeFilename => &[UploadCheck::SanitizeFilename],
        UploadCheck::MultipartValidation => &[UploadCheck::MultipartValidation],
    }
}
