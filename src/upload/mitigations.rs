//! Upload validation.
//!
//! Every secure route runs the same baseline (filename sanitization,
//! declared content type, size limit) and then the checks it is named
//! after. The result is the filename the file will be stored under.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::UploadConfig;
use crate::mitigation::{signature, Rejection};
use crate::upload::models::{FormPart, UploadCheck, UploadForm};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-\w.]").expect("static pattern"));

/// A validated file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: usize,
    allowed_mime_types: Vec<String>,
    allowed_extensions: Vec<String>,
    malicious_markers: Vec<Vec<u8>>,
}

impl UploadPolicy {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_mime_types: config.allowed_mime_types.clone(),
            allowed_extensions: config.allowed_extensions.iter().map(|e| e.to_lowercase()).collect(),
            malicious_markers: config
                .malicious_markers
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.as_bytes().to_vec())
                .collect(),
        }
    }

    /// Run the baseline and then `checks`, in the order given.
    pub fn validate(
        &self,
        form: &UploadForm,
        part: &FormPart,
        checks: &[UploadCheck],
    ) -> Result<AcceptedFile, Rejection> {
        let original = part.file_name.as_deref().unwrap_or_default();
        let mut filename = sanitize_filename(original)
            .ok_or_else(|| Rejection::new("sanitize_filename", "Invalid filename"))?;

        let content_type = part.content_type.clone().unwrap_or_default();
        if !self.allowed_mime_types.contains(&content_type) {
            return Err(Rejection::new(
                "mime_type",
                format!("Unsupported content type: {}", content_type),
            ));
        }

        self.check_size(&part.data)?;

        for check in checks {
            match check {
                UploadCheck::SizeLimit => self.check_size(&part.data)?,
                UploadCheck::SanitizeFilename => {
                    filename = sanitize_filename(&filename)
                        .ok_or_else(|| Rejection::new(check.as_str(), "Invalid filename"))?;
                }
                UploadCheck::RandomFilename => filename = randomize_filename(&filename),
                UploadCheck::Extension => {
                    if !self.extension_allowed(&filename) {
                        return Err(Rejection::new(check.as_str(), "File extension not allowed"));
                    }
                }
                UploadCheck::MimeType => {
                    let detected = signature::detect_mime(&part.data);
                    if !self.allowed_mime_types.iter().any(|m| m == detected) {
                        return Err(Rejection::new(
                            check.as_str(),
                            format!("Detected MIME type {} not allowed", detected),
                        ));
                    }
                }
                UploadCheck::MagicNumber => {
                    let detected = signature::detect_mime(&part.data);
                    if !signature::matches_signature(&part.data, detected) {
                        return Err(Rejection::new(
                            check.as_str(),
                            "File signature doesn't match content type",
                        ));
                    }
                }
                UploadCheck::MalwareScan => {
                    if self.contains_malicious_marker(&part.data) {
                        return Err(Rejection::new(
                            check.as_str(),
                            "File contains potentially malicious content",
                        ));
                    }
                }
                UploadCheck::MultipartValidation => validate_multipart(form)?,
            }
        }

        Ok(AcceptedFile {
            filename,
            content_type,
        })
    }

    fn check_size(&self, data: &[u8]) -> Result<(), Rejection> {
        if data.len() > self.max_file_size {
            return Err(Rejection::new("size_limit", "File size exceeds allowed limit"));
        }
        Ok(())
    }

    pub fn extension_allowed(&self, filename: &str) -> bool {
        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .allowed_extensions
                .contains(&format!(".{}", ext.to_lowercase())),
            None => false,
        }
    }

    pub fn contains_malicious_marker(&self, data: &[u8]) -> bool {
        self.malicious_markers
            .iter()
            .any(|marker| data.windows(marker.len()).any(|w| w == marker.as_slice()))
    }
}

/// Basename only, spaces to underscores, anything outside `[-\w.]` dropped.
///
/// `None` when nothing usable is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = Path::new(filename).file_name()?.to_str()?;
    let cleaned = UNSAFE_FILENAME_CHARS
        .replace_all(&base.replace(' ', "_"), "")
        .into_owned();
    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// `uuid.hex` plus the original extension.
pub fn randomize_filename(filename: &str) -> String {
    let stem = uuid::Uuid::new_v4().simple().to_string();
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Exactly one `file` part, carrying a filename and a content type.
pub fn validate_multipart(form: &UploadForm) -> Result<(), Rejection> {
    let strategy = UploadCheck::MultipartValidation.as_str();
    let files: Vec<&FormPart> = form
        .parts
        .iter()
        .filter(|p| p.name.as_deref() == Some("file"))
        .collect();

    match files.as_slice() {
        [part] => {
            if part.file_name.as_deref().map_or(true, str::is_empty) {
                return Err(Rejection::new(strategy, "File part has no filename"));
            }
            if part.content_type.as_deref().map_or(true, str::is_empty) {
                return Err(Rejection::new(strategy, "File part has no content type"));
            }
            if form.parts.iter().any(|p| p.name.is_none()) {
                return Err(Rejection::new(strategy, "Unnamed multipart section"));
            }
            Ok(())
        }
        [] => Err(Rejection::new(strategy, "No file part")),
        _ => Err(Rejection::new(strategy, "Multiple file parts")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::new(&UploadConfig::default())
    }

    fn part(filename: &str, content_type: &str, data: &[u8]) -> FormPart {
        FormPart {
            name: Some("file".to_string()),
            file_name: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.to_vec(),
        }
    }

    fn form(parts: Vec<FormPart>) -> UploadForm {
        UploadForm { parts }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("my photo (1).png").as_deref(), Some("my_photo_1.png"));
        assert_eq!(sanitize_filename("shell.php;.jpg").as_deref(), Some("shell.php.jpg"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("???"), None);
    }

    #[test]
    fn test_randomize_filename_keeps_extension() {
        let name = randomize_filename("cat.png");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[test]
    fn test_baseline_rejects_declared_type() {
        let p = part("a.php", "application/x-php", b"<?php ?>");
        let err = policy().validate(&form(vec![p.clone()]), &p, &[]).unwrap_err();
        assert_eq!(err.reason, "Unsupported content type: application/x-php");
    }

    #[test]
    fn test_size_limit_always_applies() {
        let data = vec![b'a'; 2 * 1024 * 1024 + 1];
        let p = part("big.txt", "text/plain", &data);
        let err = policy().validate(&form(vec![p.clone()]), &p, &[UploadCheck::Extension]).unwrap_err();
        assert_eq!(err.strategy, "size_limit");
    }

    #[test]
    fn test_extension_check() {
        let policy = policy();
        assert!(policy.extension_allowed("photo.JPG"));
        assert!(!policy.extension_allowed("shell.php"));
        assert!(!policy.extension_allowed("README"));
    }

    #[test]
    fn test_magic_number_rejects_disguised_script() {
        let p = part("image.png", "image/png", b"<?php system($_GET['c']); ?>");
        let err = policy()
            .validate(&form(vec![p.clone()]), &p, &[UploadCheck::MagicNumber])
            .unwrap_err();
        assert_eq!(err.strategy, "magic_number");

        let p = part("image.png", "image/png", PNG);
        assert!(policy().validate(&form(vec![p.clone()]), &p, &[UploadCheck::MagicNumber]).is_ok());
    }

    #[test]
    fn test_mime_type_uses_content() {
        let p = part("tool.txt", "text/plain", b"\x7fELF\x02\x01\x01\x00");
        let err = policy()
            .validate(&form(vec![p.clone()]), &p, &[UploadCheck::MimeType])
            .unwrap_err();
        assert_eq!(err.reason, "Detected MIME type application/octet-stream not allowed");
    }

    #[test]
    fn test_malware_scan() {
        let p = part("notes.txt", "text/plain", b"hello <% eval %> world");
        assert!(policy()
            .validate(&form(vec![p.clone()]), &p, &[UploadCheck::MalwareScan])
            .is_err());
    }

    #[test]
    fn test_multipart_structure() {
        let a = part("a.txt", "text/plain", b"a");
        let b = part("b.txt", "text/plain", b"b");
        assert!(validate_multipart(&form(vec![a.clone()])).is_ok());
        assert_eq!(
            validate_multipart(&form(vec![a.clone(), b])).unwrap_err().reason,
            "Multiple file parts"
        );
        let mut bare = a;
        bare.content_type = None;
        assert!(validate_multipart(&form(vec![bare])).is_err());
    }

    #[test]
    fn test_comprehensive_accepts_clean_png() {
        let p = part("holiday photo.png", "image/png", PNG);
        let accepted = policy()
            .validate(&form(vec![p.clone()]), &p, &UploadCheck::ALL)
            .unwrap();
        assert!(accepted.filename.ends_with(".png"));
        assert_ne!(accepted.filename, "holiday_photo.png");
        assert_eq!(accepted.content_type, "image/png");
    }
}
