//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that configured patterns compile and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LabConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::LabConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `lfi.max_file_size`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &LabConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address when metrics are enabled",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.security.max_body_size < config.upload.max_file_size {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be at least upload.max_file_size",
        ));
    }

    if config.cmdi.max_command_length == 0 {
        errors.push(ValidationError::new("cmdi.max_command_length", "must be greater than 0"));
    }

    if config.upload.max_file_size == 0 {
        errors.push(ValidationError::new("upload.max_file_size", "must be greater than 0"));
    }

    if config.upload.upload_dir.trim().is_empty() {
        errors.push(ValidationError::new("upload.upload_dir", "cannot be empty"));
    }

    if config.lfi.max_file_size == 0 {
        errors.push(ValidationError::new("lfi.max_file_size", "must be greater than 0"));
    }

    if let Err(e) = regex::Regex::new(&config.lfi.safe_filename_pattern) {
        errors.push(ValidationError::new("lfi.safe_filename_pattern", e.to_string()));
    }

    if let Err(e) = regex::Regex::new(&config.sqli.allowed_chars) {
        errors.push(ValidationError::new("sqli.allowed_chars", e.to_string()));
    }

    if config.sqli.database_path.trim().is_empty() {
        errors.push(ValidationError::new("sqli.database_path", "cannot be empty"));
    }

    if config.ssrf.request_timeout_secs == 0 {
        errors.push(ValidationError::new("ssrf.request_timeout_secs", "must be greater than 0"));
    }

    if config.ssrf.allowed_schemes.is_empty() {
        errors.push(ValidationError::new("ssrf.allowed_schemes", "cannot be empty"));
    }

    if config.xxe.allowed_tags.is_empty() {
        errors.push(ValidationError::new("xxe.allowed_tags", "cannot be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&LabConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = LabConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.request_secs = 0;
        config.lfi.safe_filename_pattern = "([".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "timeouts.request_secs", "lfi.safe_filename_pattern"]
        );
    }
}
