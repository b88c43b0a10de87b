//! Local file inclusion and path traversal.
//!
//! `/vulnerable/lfi` opens whatever path it is given. `/protected/lfi`
//! dispatches on the `method` query parameter through the guard table in
//! `guards.rs`; relative paths resolve against the configured working
//! directory.

pub mod guards;
pub mod handlers;
pub mod models;
pub mod primitive;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::LfiConfig;

pub use guards::{guard_table, FileGuard, GuardContext};
pub use handlers::LfiState;
pub use models::{FileResponse, ProtectionMethod};

/// Build the `/lfi` router. Allowed directories should exist beforehand so
/// they resolve to canonical paths.
pub fn router(config: &LfiConfig) -> Result<Router, regex::Error> {
    let state = Arc::new(LfiState {
        ctx: GuardContext::new(config)?,
        guards: guard_table(),
    });

    Ok(Router::new()
        .route("/", get(handlers::index))
        .route("/vulnerable/lfi", get(handlers::vulnerable))
        .route("/protected/lfi", get(handlers::protected))
        .with_state(state))
}
