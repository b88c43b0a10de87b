//! XML external entities.
//!
//! `/insecure/parse` expands every entity in the DOCTYPE, reading `SYSTEM`
//! entities from disk. The secure routes refuse external entities, refuse
//! DTDs outright, restrict element names, avoid XML input altogether, or
//! check the document against a fixed structure.
//!
//! # Data Flow
//! ```text
//! application/xml body
//!     → entities.rs (DOCTYPE stripped, references substituted per policy)
//!     → mitigations.rs (roxmltree parse, whitelist, structure, regex parser)
//!     → {"username": ...}
//! ```

pub mod entities;
pub mod handlers;
pub mod mitigations;
pub mod models;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::config::XxeConfig;

pub use handlers::XxeState;
pub use models::XmlStrategy;

/// Build the `/xxe` router.
pub fn router(config: &XxeConfig) -> Router {
    let state = Arc::new(XxeState {
        upload_dir: PathBuf::from(&config.upload_dir),
        allowed_extensions: config
            .allowed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect(),
        allowed_tags: config.allowed_tags.iter().cloned().collect(),
    });

    let mut router = Router::new().route("/", get(handlers::index));
    for strategy in XmlStrategy::ALL {
        router = router.route(
            &strategy.path(),
            post(move |state: State<Arc<XxeState>>, headers: HeaderMap, body: Bytes| {
                handlers::parse(state, strategy, headers, body)
            }),
        );
    }

    router
        .route("/secure/json_to_xml", post(handlers::json_to_xml))
        .route("/insecure/upload", post(handlers::insecure_upload))
        .route("/secure/sandbox_upload", post(handlers::sandbox_upload))
        .with_state(state)
}
