use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-]+@[\w.\-]+\.\w+$").expect("static pattern"));

/// The record every XML route extracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[serde(default)]
    #[validate(regex(path = *EMAIL, message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 120))]
    pub age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameResponse {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// How an XML route parses its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XmlStrategy {
    /// Vulnerable: entities expanded, external ones read from disk.
    Insecure,
    DisableEntities,
    UseDefusedxml,
    WhitelistValidation,
    CustomParser,
    XsdValidation,
}

impl XmlStrategy {
    pub const ALL: [XmlStrategy; 6] = [
        XmlStrategy::Insecure,
        XmlStrategy::DisableEntities,
        XmlStrategy::UseDefusedxml,
        XmlStrategy::WhitelistValidation,
        XmlStrategy::CustomParser,
        XmlStrategy::XsdValidation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            XmlStrategy::Insecure => "insecure",
            XmlStrategy::DisableEntities => "disable_entities",
            XmlStrategy::UseDefusedxml => "use_defusedxml",
            XmlStrategy::WhitelistValidation => "whitelist_validation",
            XmlStrategy::CustomParser => "custom_parser",
            XmlStrategy::XsdValidation => "xsd_validation",
        }
    }

    /// Route below `/xxe`.
    pub fn path(&self) -> String {
        match self {
            XmlStrategy::Insecure => "/insecure/parse".to_string(),
            other => format!("/secure/{}", other.as_str()),
        }
    }
}
