//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the lab.
//! All types derive Serde traits for deserialization from config files.
//! Every section carries the constants of one demo module so a lab operator
//! can point the services at scratch directories without recompiling.

use serde::{Deserialize, Serialize};

/// Root configuration for the mitigation lab.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LabConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Server-wide request hardening.
    pub security: SecurityConfig,

    pub cmdi: CommandInjectionConfig,

    pub idor: IdorConfig,

    pub upload: UploadConfig,

    pub lfi: LfiConfig,

    pub sqli: SqlInjectionConfig,

    pub ssrf: SsrfConfig,

    pub xss: XssConfig,

    pub xxe: XxeConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            // Loopback only: the vulnerable routes must never face a network.
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Command injection demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandInjectionConfig {
    /// Longest command accepted by the length restriction route.
    pub max_command_length: usize,

    /// Substrings rejected by the blacklist route.
    pub blacklisted_keywords: Vec<String>,

    /// Packet count passed to the mapped `ping` command.
    pub ping_count: u32,
}

impl Default for CommandInjectionConfig {
    fn default() -> Self {
        Self {
            max_command_length: 20,
            blacklisted_keywords: ["rm", ";", "&&", "||", ">", "<", "|", "&"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ping_count: 4,
        }
    }
}

/// IDOR demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdorConfig {
    /// Realm announced in `WWW-Authenticate` challenges.
    pub realm: String,
}

impl Default for IdorConfig {
    fn default() -> Self {
        Self {
            realm: "idor-lab".to_string(),
        }
    }
}

/// File upload demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Root upload directory; `secure/` and `insecure/` live below it.
    pub upload_dir: String,

    /// Maximum accepted file size in bytes.
    pub max_file_size: usize,

    /// MIME types accepted by the secure routes.
    pub allowed_mime_types: Vec<String>,

    /// File extensions (with dot, lowercase) accepted by the secure routes.
    pub allowed_extensions: Vec<String>,

    /// Byte sequences that mark a file as a server-side script.
    pub malicious_markers: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".to_string(),
            max_file_size: 2 * 1024 * 1024, // 2MB
            allowed_mime_types: ["image/jpeg", "image/png", "application/pdf", "image/gif", "text/plain"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_extensions: [".jpg", ".jpeg", ".png", ".pdf", ".gif", ".txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            malicious_markers: ["<?php", "<?=", "<? ", "<%", "%>"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Local file inclusion demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LfiConfig {
    /// Directory relative paths are resolved against.
    pub working_dir: String,

    /// Default allowed directory (relative to `working_dir` unless absolute).
    pub allowed_dir: String,

    /// Additional allowed directories.
    pub extra_allowed_dirs: Vec<String>,

    /// Allowed file extensions (with dot, lowercase).
    pub allowed_extensions: Vec<String>,

    /// Allowed bare filenames.
    pub allowed_files: Vec<String>,

    /// Substrings rejected by the blacklist method.
    pub blacklisted_patterns: Vec<String>,

    /// Maximum readable file size in bytes.
    pub max_file_size: u64,

    /// Pattern a whole path must match for the regex method.
    pub safe_filename_pattern: String,

    /// MIME types accepted by the MIME check.
    pub allowed_mime_types: Vec<String>,
}

impl Default for LfiConfig {
    fn default() -> Self {
        Self {
            working_dir: ".".to_string(),
            allowed_dir: "allowed_files".to_string(),
            extra_allowed_dirs: vec!["static".to_string()],
            allowed_extensions: [".txt", ".log", ".csv"].iter().map(|s| s.to_string()).collect(),
            allowed_files: ["readme.txt", "notes.txt", "data.csv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blacklisted_patterns: ["..", "/etc", "/passwd", "~", ".ssh", ".config"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: 1024 * 1024, // 1MB
            safe_filename_pattern: r"^[a-zA-Z0-9_\-/]+\.(txt|log|csv)$".to_string(),
            allowed_mime_types: ["text/plain", "text/csv", "application/json"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// SQL injection demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlInjectionConfig {
    /// SQLite database file.
    pub database_path: String,

    /// Maximum length of username/password for the validating routes.
    pub max_input_length: u64,

    /// Character allowlist for the validating routes.
    pub allowed_chars: String,

    /// Keywords the WAF and the combined route refuse.
    pub sql_keywords: Vec<String>,
}

impl Default for SqlInjectionConfig {
    fn default() -> Self {
        Self {
            database_path: "instance/vulnerable_app.db".to_string(),
            max_input_length: 100,
            allowed_chars: r"^[a-zA-Z0-9_\-\.@ ]+$".to_string(),
            sql_keywords: [
                "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "UNION", "OR", "AND", "--", ";", "/*",
                "*/", "EXEC",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// SSRF demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsrfConfig {
    /// Hosts (and literal IPs) refused by the blocklist and IP block routes.
    pub blocklist: Vec<String>,

    /// Hosts accepted by the allowlist route.
    pub allowed_domains: Vec<String>,

    /// URL schemes accepted by the scheme filter.
    pub allowed_schemes: Vec<String>,

    /// Outbound timeout for the timeout route, in seconds.
    pub request_timeout_secs: u64,

    /// Request headers stripped by the header sanitization route.
    pub sensitive_headers: Vec<String>,
}

impl Default for SsrfConfig {
    fn default() -> Self {
        Self {
            blocklist: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            allowed_domains: vec!["example.com".to_string()],
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            request_timeout_secs: 5,
            sensitive_headers: ["Cookie", "Authorization", "X-Secret"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// XSS demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct XssConfig {
    /// Content-Security-Policy sent by the CSP route.
    pub content_security_policy: String,

    /// Value of the demo session cookie.
    pub session_token: String,
}

impl Default for XssConfig {
    fn default() -> Self {
        Self {
            content_security_policy: "default-src 'self'; script-src 'self'; object-src 'none'; \
                                      base-uri 'self'; frame-ancestors 'none'; "
                .to_string(),
            session_token: "example_token".to_string(),
        }
    }
}

/// XXE demo settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct XxeConfig {
    /// Directory receiving uploaded XML documents.
    pub upload_dir: String,

    /// Extensions (without dot) accepted by the sandboxed upload.
    pub allowed_extensions: Vec<String>,

    /// Element names accepted by the whitelist route.
    pub allowed_tags: Vec<String>,
}

impl Default for XxeConfig {
    fn default() -> Self {
        Self {
            upload_dir: "xml_uploads".to_string(),
            allowed_extensions: vec!["txt".to_string(), "pdf".to_string(), "png".to_string()],
            allowed_tags: ["user", "username", "email", "age"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LabConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:7000"

            [ssrf]
            allowed_domains = ["internal.example"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
        assert_eq!(config.ssrf.allowed_domains, vec!["internal.example"]);
        assert_eq!(config.ssrf.request_timeout_secs, 5);
        assert_eq!(config.cmdi.max_command_length, 20);
        assert_eq!(config.upload.max_file_size, 2 * 1024 * 1024);
    }
}
