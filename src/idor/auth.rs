//! HTTP Basic authentication against the seeded user table.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::LabError;
use crate::idor::handlers::IdorState;
use crate::idor::models::User;

/// The authenticated caller of an IDOR route.
#[derive(Debug, Clone)]
pub struct Authenticated(pub User);

impl FromRequestParts<Arc<IdorState>> for Authenticated {
    type Rejection = LabError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<IdorState>,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || LabError::Unauthorized {
            realm: state.realm.clone(),
        };

        let (username, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic)
            .ok_or_else(unauthorized)?;

        match state.store.authenticate(&username, &password) {
            Some(user) => Ok(Self(user.clone())),
            None => {
                tracing::warn!(username = %username, "Incorrect username or password");
                Err(unauthorized())
            }
        }
    }
}

/// Decode `Basic base64(user:password)`.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let header = format!("Basic {}", STANDARD.encode("alice:alice123"));
        assert_eq!(
            parse_basic(&header),
            Some(("alice".to_string(), "alice123".to_string()))
        );
        // Password may itself contain a colon.
        let header = format!("basic {}", STANDARD.encode("bob:a:b"));
        assert_eq!(parse_basic(&header), Some(("bob".to_string(), "a:b".to_string())));
    }

    #[test]
    fn test_parse_basic_rejects_other_schemes() {
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }
}
