use serde::{Deserialize, Serialize};
use validator::Validate;

/// Rendering strategy of an XSS route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XssType {
    Vulnerable,
    EscapeHtml,
    Csp,
    Sanitize,
    Whitelist,
    NoJs,
    JinjaAutoescape,
    HttponlyCookie,
    DomProtected,
}

impl XssType {
    pub const ALL: [XssType; 9] = [
        XssType::Vulnerable,
        XssType::EscapeHtml,
        XssType::Csp,
        XssType::Sanitize,
        XssType::Whitelist,
        XssType::NoJs,
        XssType::JinjaAutoescape,
        XssType::HttponlyCookie,
        XssType::DomProtected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            XssType::Vulnerable => "vulnerable",
            XssType::EscapeHtml => "escape-html",
            XssType::Csp => "csp",
            XssType::Sanitize => "sanitize",
            XssType::Whitelist => "whitelist",
            XssType::NoJs => "no-js",
            XssType::JinjaAutoescape => "jinja-autoescape",
            XssType::HttponlyCookie => "httponly-cookie",
            XssType::DomProtected => "dom-protected",
        }
    }

    /// Route below `/xss`.
    pub fn path(&self) -> &'static str {
        match self {
            XssType::Vulnerable => "/vulnerable",
            XssType::EscapeHtml => "/escape-html",
            XssType::Csp => "/csp-protected",
            XssType::Sanitize => "/sanitize-input",
            XssType::Whitelist => "/whitelist",
            XssType::NoJs => "/no-js",
            XssType::JinjaAutoescape => "/jinja-autoescape",
            XssType::HttponlyCookie => "/httponly-cookie",
            XssType::DomProtected => "/dom-protected",
        }
    }
}

/// Form body of every XSS route.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 500))]
    pub input: String,
    pub xss_type: XssType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomResponse {
    pub result: String,
    pub xss_type: XssType,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_decoding() {
        let input: UserInput =
            decode_form("input=%3Cb%3Ehi%3C%2Fb%3E&xss_type=escape-html");
        assert_eq!(input.input, "<b>hi</b>");
        assert_eq!(input.xss_type, XssType::EscapeHtml);
    }

    #[test]
    fn test_length_bounds() {
        let empty = UserInput { input: String::new(), xss_type: XssType::Vulnerable };
        assert!(empty.validate().is_err());
        let long = UserInput { input: "a".repeat(501), xss_type: XssType::Vulnerable };
        assert!(long.validate().is_err());
        let edge = UserInput { input: "é".repeat(500), xss_type: XssType::Vulnerable };
        assert!(edge.validate().is_ok());
    }

    fn decode_form(body: &str) -> UserInput {
        let pairs: std::collections::HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        serde_json::from_value(serde_json::json!(pairs)).unwrap()
    }
}
