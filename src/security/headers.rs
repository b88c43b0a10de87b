//! Security response headers.
//!
//! # Responsibilities
//! - `X-Content-Type-Options: nosniff` and `X-Frame-Options: DENY`
//! - Optional `Content-Security-Policy`
//!
//! # Design Decisions
//! - The policy string is parsed into a `HeaderValue` once, at router build
//! - Applied per route, never globally: the vulnerable routes must stay bare

use axum::http::header::{
    InvalidHeaderValue, CONTENT_SECURITY_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, HeaderValue};

#[derive(Debug, Clone)]
pub struct SecureHeaders {
    csp: Option<HeaderValue>,
}

impl SecureHeaders {
    /// Headers without a content security policy.
    pub fn basic() -> Self {
        Self { csp: None }
    }

    pub fn with_csp(policy: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            csp: Some(HeaderValue::from_str(policy.trim())?),
        })
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        if let Some(csp) = &self.csp {
            headers.insert(CONTENT_SECURITY_POLICY, csp.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_with_csp() {
        let mut headers = HeaderMap::new();
        SecureHeaders::with_csp("default-src 'self'; ").unwrap().apply(&mut headers);
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[CONTENT_SECURITY_POLICY], "default-src 'self';");
    }

    #[test]
    fn test_basic_has_no_csp() {
        let mut headers = HeaderMap::new();
        SecureHeaders::basic().apply(&mut headers);
        assert!(!headers.contains_key(CONTENT_SECURITY_POLICY));
    }

    #[test]
    fn test_newline_in_policy_is_refused() {
        assert!(SecureHeaders::with_csp("default-src\n'self'").is_err());
    }
}
