//! Input checks applied before a login query runs.
//!
//! None of these checks make string-built SQL safe. They sit in front of
//! bound-parameter queries as a second layer.

use regex::Regex;
use std::sync::LazyLock;
use validator::ValidationErrors;

use crate::config::SqlInjectionConfig;
use crate::mitigation::validation::field_error;
use crate::sqli::models::LoginRequest;

/// Signatures the WAF looks for besides the keyword list.
static ATTACK_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"'.*--").expect("static pattern"),
        Regex::new(r";").expect("static pattern"),
        Regex::new(r"/\*.*\*/").expect("static pattern"),
    ]
});

/// Configured input rules for the validating routes.
#[derive(Debug, Clone)]
pub struct InputPolicy {
    max_length: usize,
    allowed_chars: Regex,
    keywords: Vec<String>,
}

impl InputPolicy {
    pub fn new(config: &SqlInjectionConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            max_length: config.max_input_length as usize,
            allowed_chars: Regex::new(&config.allowed_chars)?,
            keywords: config.sql_keywords.iter().map(|k| k.to_uppercase()).collect(),
        })
    }

    /// Length and character allowlist on both fields.
    pub fn validate(&self, login: &LoginRequest) -> Result<(), ValidationErrors> {
        for (field, value) in [("username", &login.username), ("password", &login.password)] {
            if value.chars().count() > self.max_length {
                return Err(field_error(field, "length", "Input too long"));
            }
            if !self.allowed_chars.is_match(value) {
                return Err(field_error(field, "chars", "Invalid input characters"));
            }
        }
        Ok(())
    }

    /// The keyword the value contains, compared case-insensitively.
    pub fn keyword_in<'a>(&'a self, value: &str) -> Option<&'a str> {
        let upper = value.to_uppercase();
        self.keywords
            .iter()
            .find(|k| upper.contains(k.as_str()))
            .map(String::as_str)
    }

    /// True when a request value looks like an injection attempt.
    pub fn is_attack(&self, value: &str) -> bool {
        self.keyword_in(value).is_some() || ATTACK_PATTERNS.iter().any(|p| p.is_match(value))
    }
}

/// Query text as a string-formatting login would build it.
pub fn format_query(login: &LoginRequest) -> String {
    format!(
        "SELECT * FROM users WHERE username = '{}' AND password = '{}'",
        login.username, login.password
    )
}

/// Query text as a concatenating login would build it.
pub fn concatenate_query(login: &LoginRequest) -> String {
    let mut query = String::from("SELECT * FROM users WHERE username = '");
    query.push_str(&login.username);
    query.push_str("' AND password = '");
    query.push_str(&login.password);
    query.push('\'');
    query
}
