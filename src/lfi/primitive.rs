//! Filesystem access for the file inclusion routes.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::mitigation::signature;

/// Files placed in the allowed directory at startup.
pub const SAMPLE_FILES: &[(&str, &str)] = &[
    ("readme.txt", "This is a sample readme file."),
    ("notes.txt", "Sample notes content."),
    ("data.csv", "id,name\n1,Test\n2,Example"),
];

/// Bytes inspected for MIME detection.
const SNIFF_LEN: u64 = 8192;

/// Facts about an existing regular file.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical path (symlinks resolved).
    pub normalized_path: PathBuf,
    pub file_size: u64,
    pub mime_type: &'static str,
    /// Whether the path as given is itself a symlink.
    pub is_symlink: bool,
}

/// Inspect `path`. Errors are client-facing messages.
pub fn file_metadata(path: &Path) -> Result<FileMetadata, String> {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);

    let normalized_path = fs::canonicalize(path).map_err(|_| "File does not exist".to_string())?;
    let metadata = fs::metadata(&normalized_path)
        .map_err(|e| format!("Error getting file metadata: {}", e))?;
    if metadata.is_dir() {
        return Err("Path is a directory, not a file".to_string());
    }

    let mut head = Vec::new();
    if let Ok(file) = fs::File::open(&normalized_path) {
        let _ = file.take(SNIFF_LEN).read_to_end(&mut head);
    }

    Ok(FileMetadata {
        normalized_path,
        file_size: metadata.len(),
        mime_type: signature::detect_mime(&head),
        is_symlink,
    })
}

/// Read a file as text, refusing anything over `max_size` bytes.
pub fn read_limited(path: &Path, max_size: u64) -> Result<String, String> {
    let size = fs::metadata(path)
        .map_err(|e| format!("Error reading file: {}", e))?
        .len();
    if size > max_size {
        return Err(format!(
            "File size {} exceeds maximum allowed {}",
            size, max_size
        ));
    }

    let mut data = Vec::new();
    fs::File::open(path)
        .and_then(|file| file.take(max_size).read_to_end(&mut data))
        .map_err(|e| format!("Error reading file: {}", e))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Read a file as text with no checks at all.
pub fn read_unchecked(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| e.to_string())
}

/// Write the sample files into `dir`, leaving existing ones alone.
pub fn seed_sample_files(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    for (name, content) in SAMPLE_FILES {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(path, content)?;
        }
    }
    Ok(())
}
