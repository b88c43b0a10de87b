//! Protection methods and response bodies of the file inclusion routes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionMethod {
    Vulnerable,
    Allowlist,
    ExtensionCheck,
    PathTraversalBlock,
    AbsolutePathRequired,
    PathNormalization,
    /// Weak: substring blacklist.
    Blacklist,
    RegexValidation,
    MimeCheck,
    SymlinkCheck,
    FileSizeLimit,
    /// Served by the path normalization guard.
    ReadLimit,
}

impl ProtectionMethod {
    pub const ALL: [ProtectionMethod; 12] = [
        ProtectionMethod::Vulnerable,
        ProtectionMethod::Allowlist,
        ProtectionMethod::ExtensionCheck,
        ProtectionMethod::PathTraversalBlock,
        ProtectionMethod::AbsolutePathRequired,
        ProtectionMethod::PathNormalization,
        ProtectionMethod::Blacklist,
        ProtectionMethod::RegexValidation,
        ProtectionMethod::MimeCheck,
        ProtectionMethod::SymlinkCheck,
        ProtectionMethod::FileSizeLimit,
        ProtectionMethod::ReadLimit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionMethod::Vulnerable => "vulnerable",
            ProtectionMethod::Allowlist => "allowlist",
            ProtectionMethod::ExtensionCheck => "extension_check",
            ProtectionMethod::PathTraversalBlock => "path_traversal_block",
            ProtectionMethod::AbsolutePathRequired => "absolute_path_required",
            ProtectionMethod::PathNormalization => "path_normalization",
            ProtectionMethod::Blacklist => "blacklist",
            ProtectionMethod::RegexValidation => "regex_validation",
            ProtectionMethod::MimeCheck => "mime_check",
            ProtectionMethod::SymlinkCheck => "symlink_check",
            ProtectionMethod::FileSizeLimit => "file_size_limit",
            ProtectionMethod::ReadLimit => "read_limit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
    pub method: Option<String>,
}

/// Body of `/protected/lfi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub protection_method: String,
}

impl FileResponse {
    pub fn failure(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
            protection_method: method.into(),
        }
    }
}
