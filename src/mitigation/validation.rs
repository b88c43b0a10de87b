//! Validating extractors.
//!
//! `ValidJson<T>` and `ValidForm<T>` deserialize with serde and then run
//! `validator::Validate`. Policy checks that need code (allowlists,
//! keyword lists, configured regexes) add to the same `ValidationErrors`
//! through [`field_error`] so the client sees one uniform error shape.

use std::borrow::Cow;

use axum::{
    extract::{FromRequest, Request},
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::LabError;

/// JSON body that passed its declarative constraints.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = LabError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| LabError::Malformed(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// URL-encoded form body that passed its declarative constraints.
#[derive(Debug, Clone)]
pub struct ValidForm<T>(pub T);

impl<S, T> FromRequest<S> for ValidForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = LabError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| LabError::Malformed(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Build a single-field error set for a policy check.
pub fn field_error(
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    errors.add(field, error);
    errors
}

/// First message of a validation error set, for modules that answer with a
/// flat `{"message": ...}` envelope.
pub fn first_message(errors: &ValidationErrors) -> String {
    crate::error::field_messages(errors)
        .into_iter()
        .next()
        .and_then(|(field, messages)| {
            messages
                .into_iter()
                .next()
                .map(|message| format!("{}: {}", field, message))
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}
