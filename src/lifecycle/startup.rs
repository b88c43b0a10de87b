//! Startup orchestration.
//!
//! # Responsibilities
//! - Create every directory a module writes to or reads from
//! - Seed the sample files served by the file inclusion routes
//! - Report anything that stops a module from being built
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Directories are created before routers are built so allowed paths
//!   canonicalize

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::LabConfig;
use crate::lfi::primitive::seed_sample_files;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot prepare directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database setup failed: {0}")]
    Database(#[from] crate::sqli::SqliSetupError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

fn create_dir(path: &Path) -> Result<(), StartupError> {
    std::fs::create_dir_all(path).map_err(|source| StartupError::Directory {
        path: path.to_path_buf(),
        source,
    })
}

/// Create module directories and seed the sample files.
pub fn prepare_filesystem(config: &LabConfig) -> Result<(), StartupError> {
    let (secure, insecure) = crate::upload::directories(&config.upload);
    create_dir(&secure)?;
    create_dir(&insecure)?;
    create_dir(Path::new(&config.xxe.upload_dir))?;

    let lfi_root = Path::new(&config.lfi.working_dir);
    let allowed = lfi_root.join(&config.lfi.allowed_dir);
    seed_sample_files(&allowed).map_err(|source| StartupError::Directory {
        path: allowed.clone(),
        source,
    })?;
    for dir in &config.lfi.extra_allowed_dirs {
        create_dir(&lfi_root.join(dir))?;
    }

    if let Some(parent) = Path::new(&config.sqli.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            create_dir(parent)?;
        }
    }

    tracing::info!(
        upload_dir = %config.upload.upload_dir,
        lfi_allowed_dir = %allowed.display(),
        database = %config.sqli.database_path,
        "Filesystem prepared"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_filesystem_creates_everything() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let mut config = LabConfig::default();
        config.upload.upload_dir = root.join("uploads").display().to_string();
        config.xxe.upload_dir = root.join("xml").display().to_string();
        config.lfi.working_dir = root.display().to_string();
        config.sqli.database_path = root.join("db/lab.db").display().to_string();

        prepare_filesystem(&config).unwrap();

        assert!(root.join("uploads/secure").is_dir());
        assert!(root.join("uploads/insecure").is_dir());
        assert!(root.join("xml").is_dir());
        assert!(root.join("allowed_files").is_dir());
        assert!(root.join("static").is_dir());
        assert!(root.join("db").is_dir());
        // Idempotent.
        prepare_filesystem(&config).unwrap();
    }
}
