//! Filesystem writes and reads for uploaded files.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Where a file ended up.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Write `data` to `dir.join(filename)`.
///
/// `filename` is joined as given: a name containing `../` lands outside
/// `dir`. Callers that care sanitize first.
pub async fn store(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<StoredFile> {
    let path = dir.join(filename);
    fs::write(&path, data).await?;
    let size = fs::metadata(&path).await?.len();
    Ok(StoredFile { path, size })
}

/// Read `dir.join(filename)`.
pub async fn load(dir: &Path, filename: &str) -> std::io::Result<Vec<u8>> {
    fs::read(dir.join(filename)).await
}
