//! Building blocks shared by the mitigation strategies of every module.
//!
//! # Data Flow
//! ```text
//! request body
//!     → validation.rs (serde + validator, field-level errors)
//!     → module strategy (pure check/transform, may return Rejection)
//!     → dangerous primitive
//! ```
//!
//! `signature.rs` holds the magic-number table used by both the upload and
//! the file inclusion modules.

pub mod signature;
pub mod validation;

use thiserror::Error;

/// A strategy refused an input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Rejection {
    /// Wire name of the strategy that refused.
    pub strategy: &'static str,
    /// Human-readable reason, returned to the client.
    pub reason: String,
}

impl Rejection {
    pub fn new(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}
