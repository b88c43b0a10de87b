//! Output transforms for the XSS routes.

use std::sync::LazyLock;

use regex::Regex;

static WHITELIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s.,!?]+$").expect("static pattern"));

/// HTML-escape `& < > " '`.
pub fn escape_html(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}

/// Strip every tag and attribute, keeping text content.
pub fn sanitize(input: &str) -> String {
    ammonia::Builder::empty().clean(input).to_string()
}

/// Only letters, digits, whitespace and `.,!?`.
pub fn whitelist(input: &str) -> Option<&str> {
    WHITELIST.is_match(input).then_some(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        let escaped = escape_html("<img src=x onerror=\"alert(1)\">");
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert!(escaped.starts_with("&lt;img"));
    }

    #[test]
    fn test_sanitize_strips_tags() {
        let cleaned = sanitize("<b onclick=\"x()\">hello</b><script>alert(1)</script>");
        assert!(cleaned.contains("hello"));
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains("onclick"));
    }

    #[test]
    fn test_whitelist() {
        assert_eq!(whitelist("Hello, world!"), Some("Hello, world!"));
        assert_eq!(whitelist("<script>"), None);
        assert_eq!(whitelist("a=b"), None);
        assert_eq!(whitelist(""), None);
    }
}
