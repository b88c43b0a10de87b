//! Upload request parts, validation methods and the response envelope.

use axum::extract::multipart::{Multipart, MultipartError};
use serde::{Deserialize, Serialize};

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// The parsed multipart body.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub parts: Vec<FormPart>,
}

impl UploadForm {
    /// Drain a multipart body into memory.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            form.parts.push(FormPart {
                name,
                file_name,
                content_type,
                data: data.to_vec(),
            });
        }
        Ok(form)
    }

    /// First part named `file`.
    pub fn file(&self) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name.as_deref() == Some("file"))
    }
}

/// Checks the secure routes can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadCheck {
    MimeType,
    Extension,
    MagicNumber,
    SizeLimit,
    RandomFilename,
    MalwareScan,
    SanitizeFilename,
    MultipartValidation,
}

impl UploadCheck {
    pub const ALL: [UploadCheck; 8] = [
        UploadCheck::MimeType,
        UploadCheck::Extension,
        UploadCheck::MagicNumber,
        UploadCheck::SizeLimit,
        UploadCheck::RandomFilename,
        UploadCheck::MalwareScan,
        UploadCheck::SanitizeFilename,
        UploadCheck::MultipartValidation,
    ];

    /// Name reported in responses and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCheck::MimeType => "mime_type",
            UploadCheck::Extension => "extension",
            UploadCheck::MagicNumber => "magic_number",
            UploadCheck::SizeLimit => "size_limit",
            UploadCheck::RandomFilename => "random_filename",
            UploadCheck::MalwareScan => "malware_scan",
            UploadCheck::SanitizeFilename => "sanitize_filename",
            UploadCheck::MultipartValidation => "multipart_validation",
        }
    }

    /// Path segment below `/upload-secure/`.
    pub fn slug(&self) -> String {
        self.as_str().replace('_', "-")
    }
}

/// JSON envelope of every upload route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}

impl UploadResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            filename: None,
            filepath: None,
            filesize: None,
            filetype: None,
        }
    }
}
