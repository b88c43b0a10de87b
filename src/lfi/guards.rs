//! File inclusion guards.
//!
//! One [`FileGuard`] per protection method, collected into a lookup table
//! keyed by [`ProtectionMethod`]. A guard turns the requested path into the
//! path that may be read, or refuses it. Guards only look at the path and
//! filesystem metadata; the read itself happens in `primitive.rs`.
//!
//! The blacklist, extension and allowlist guards are deliberately partial
//! and labeled as such. The MIME, symlink and size guards are layered on top
//! of directory confinement, since none of them says anything about where a
//! file lives.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::config::LfiConfig;
use crate::lfi::models::ProtectionMethod;
use crate::lfi::primitive::{file_metadata, FileMetadata};

/// Resolved directories and lists shared by every guard.
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub working_dir: PathBuf,
    pub default_dir: PathBuf,
    pub allowed_dirs: Vec<PathBuf>,
    pub allowed_extensions: Vec<String>,
    pub allowed_files: Vec<String>,
    pub blacklisted_patterns: Vec<String>,
    pub safe_filename: Regex,
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: u64,
}

impl GuardContext {
    pub fn new(config: &LfiConfig) -> Result<Self, regex::Error> {
        let working_dir = absolute(Path::new(&config.working_dir), &std::env::current_dir().unwrap_or_default());
        let resolve_dir = |dir: &str| {
            let path = absolute(Path::new(dir), &working_dir);
            std::fs::canonicalize(&path).unwrap_or(path)
        };

        let default_dir = resolve_dir(&config.allowed_dir);
        let mut allowed_dirs = vec![default_dir.clone()];
        allowed_dirs.extend(config.extra_allowed_dirs.iter().map(|d| resolve_dir(d)));

        Ok(Self {
            working_dir: std::fs::canonicalize(&working_dir).unwrap_or(working_dir),
            default_dir,
            allowed_dirs,
            allowed_extensions: config.allowed_extensions.iter().map(|e| e.to_lowercase()).collect(),
            allowed_files: config.allowed_files.clone(),
            blacklisted_patterns: config.blacklisted_patterns.clone(),
            safe_filename: Regex::new(&config.safe_filename_pattern)?,
            allowed_mime_types: config.allowed_mime_types.clone(),
            max_file_size: config.max_file_size,
        })
    }

    /// The requested path, anchored at the working directory if relative.
    pub fn resolve(&self, requested: &str) -> PathBuf {
        absolute(Path::new(requested), &self.working_dir)
    }

    fn in_allowed_dirs(&self, path: &Path) -> bool {
        self.allowed_dirs.iter().any(|dir| path.starts_with(dir))
    }

    /// Metadata of an existing file, with the client-facing error otherwise.
    fn metadata(&self, requested: &str) -> Result<FileMetadata, String> {
        file_metadata(&self.resolve(requested))
    }

    fn confined(&self, requested: &str) -> Result<FileMetadata, String> {
        let metadata = self.metadata(requested)?;
        if !self.in_allowed_dirs(&metadata.normalized_path) {
            return Err("File not in allowed directories".to_string());
        }
        Ok(metadata)
    }
}

/// A protection method's path check.
pub trait FileGuard: Send + Sync + Debug {
    /// Method reported back to the client.
    fn method(&self) -> ProtectionMethod;

    /// Path to read, or the reason the request is refused.
    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String>;

    /// Whether reads through this guard are size-limited.
    fn limits_reads(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct Unguarded;

impl FileGuard for Unguarded {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::Vulnerable
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        Ok(ctx.resolve(requested))
    }

    fn limits_reads(&self) -> bool {
        false
    }
}

/// Weak: only the final path component is compared.
#[derive(Debug)]
pub struct Allowlist;

impl FileGuard for Allowlist {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::Allowlist
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let name = Path::new(requested)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !ctx.allowed_files.iter().any(|f| f == name) {
            return Err(format!("File {} not in allowed list", name));
        }
        Ok(ctx.metadata(requested)?.normalized_path)
    }
}

/// Weak: any readable file with the right suffix passes.
#[derive(Debug)]
pub struct ExtensionCheck;

impl FileGuard for ExtensionCheck {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::ExtensionCheck
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let suffix = Path::new(requested)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        if !ctx.allowed_extensions.contains(&suffix.to_lowercase()) {
            return Err(format!("Extension {} not allowed", suffix));
        }
        Ok(ctx.metadata(requested)?.normalized_path)
    }
}

#[derive(Debug)]
pub struct PathTraversalBlock;

impl FileGuard for PathTraversalBlock {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::PathTraversalBlock
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        if requested.contains("..") || requested.to_lowercase().contains("%2e%2e") {
            return Err("Path traversal detected".to_string());
        }
        Ok(ctx.metadata(requested)?.normalized_path)
    }
}

#[derive(Debug)]
pub struct AbsolutePathRequired;

impl FileGuard for AbsolutePathRequired {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::AbsolutePathRequired
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        Ok(ctx.confined(requested)?.normalized_path)
    }
}

/// Lexical normalization, containment in the default directory, then the
/// same test again after symlinks are resolved.
#[derive(Debug)]
pub struct PathNormalization;

impl FileGuard for PathNormalization {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::PathNormalization
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let normalized = lexical_normalize(&ctx.resolve(requested));
        if !normalized.starts_with(&ctx.default_dir) {
            return Err("Access denied".to_string());
        }
        let metadata = file_metadata(&normalized)?;
        if !metadata.normalized_path.starts_with(&ctx.default_dir) {
            return Err("Access denied".to_string());
        }
        Ok(metadata.normalized_path)
    }
}

/// Weak: substring blacklist.
#[derive(Debug)]
pub struct Blacklist;

impl FileGuard for Blacklist {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::Blacklist
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let lower = requested.to_lowercase();
        if let Some(pattern) = ctx
            .blacklisted_patterns
            .iter()
            .find(|p| lower.contains(&p.to_lowercase()))
        {
            return Err(format!("Blacklisted pattern detected: {}", pattern));
        }
        Ok(ctx.metadata(requested)?.normalized_path)
    }
}

#[derive(Debug)]
pub struct RegexValidation;

impl FileGuard for RegexValidation {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::RegexValidation
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let full_match = ctx
            .safe_filename
            .find(requested)
            .is_some_and(|m| m.start() == 0 && m.end() == requested.len());
        if !full_match {
            return Err("Filename doesn't match safe pattern".to_string());
        }
        Ok(ctx.metadata(requested)?.normalized_path)
    }
}

#[derive(Debug)]
pub struct MimeCheck;

impl FileGuard for MimeCheck {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::MimeCheck
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let metadata = ctx.confined(requested)?;
        if !ctx.allowed_mime_types.iter().any(|m| m == metadata.mime_type) {
            return Err(format!("MIME type {} not allowed", metadata.mime_type));
        }
        Ok(metadata.normalized_path)
    }
}

#[derive(Debug)]
pub struct SymlinkCheck;

impl FileGuard for SymlinkCheck {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::SymlinkCheck
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let metadata = ctx.metadata(requested)?;
        if !ctx.in_allowed_dirs(&metadata.normalized_path) {
            return Err(if metadata.is_symlink {
                "Symlink target not in allowed directories".to_string()
            } else {
                "File not in allowed directories".to_string()
            });
        }
        Ok(metadata.normalized_path)
    }
}

#[derive(Debug)]
pub struct FileSizeLimit;

impl FileGuard for FileSizeLimit {
    fn method(&self) -> ProtectionMethod {
        ProtectionMethod::FileSizeLimit
    }

    fn check(&self, ctx: &GuardContext, requested: &str) -> Result<PathBuf, String> {
        let metadata = ctx.confined(requested)?;
        if metadata.file_size > ctx.max_file_size {
            return Err(format!("File size exceeds {} bytes limit", ctx.max_file_size));
        }
        Ok(metadata.normalized_path)
    }
}

/// Every protection method mapped to its guard.
pub fn guard_table() -> HashMap<ProtectionMethod, Box<dyn FileGuard>> {
    let mut table: HashMap<ProtectionMethod, Box<dyn FileGuard>> = HashMap::new();
    table.insert(ProtectionMethod::Vulnerable, Box::new(Unguarded));
    table.insert(ProtectionMethod::Allowlist, Box::new(Allowlist));
    table.insert(ProtectionMethod::ExtensionCheck, Box::new(ExtensionCheck));
    table.insert(ProtectionMethod::PathTraversalBlock, Box::new(PathTraversalBlock));
    table.insert(ProtectionMethod::AbsolutePathRequired, Box::new(AbsolutePathRequired));
    table.insert(ProtectionMethod::PathNormalization, Box::new(PathNormalization));
    table.insert(ProtectionMethod::Blacklist, Box::new(Blacklist));
    table.insert(ProtectionMethod::RegexValidation, Box::new(RegexValidation));
    table.insert(ProtectionMethod::MimeCheck, Box::new(MimeCheck));
    table.insert(ProtectionMethod::SymlinkCheck, Box::new(SymlinkCheck));
    table.insert(ProtectionMethod::FileSizeLimit, Box::new(FileSizeLimit));
    table.insert(ProtectionMethod::ReadLimit, Box::new(PathNormalization));
    table
}

fn absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Remove `.` and resolve `..` without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
