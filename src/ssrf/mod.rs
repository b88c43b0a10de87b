//! Server-side request forgery.
//!
//! `/vulnerable/ssrf` fetches whatever URL the client names. Each
//! `/protected/*` route applies one [`Protection`] before the request is
//! sent.
//!
//! # Data Flow
//! ```text
//! {"url", "method"?, "headers"?}
//!     → models.rs (serde + validator: non-blank url, GET|POST|HEAD)
//!     → mitigations.rs (Protection → Outbound or Rejection)
//!         → network.rs (DNS resolution, private range check)
//!     → primitive.rs (reqwest)
//! ```

pub mod handlers;
pub mod mitigations;
pub mod models;
pub mod network;
pub mod primitive;

use std::sync::Arc;

use axum::{extract::State, routing::post, Router};

use crate::config::SsrfConfig;
use crate::mitigation::validation::ValidJson;

pub use handlers::SsrfState;
pub use mitigations::{Protection, SsrfPolicy};

/// Build the `/ssrf` router.
pub fn router(config: &SsrfConfig) -> reqwest::Result<Router> {
    let state = Arc::new(SsrfState {
        policy: SsrfPolicy::new(config),
        client: primitive::client()?,
    });

    let mut router = Router::new().route("/vulnerable/ssrf", post(handlers::vulnerable));
    for protection in Protection::ALL {
        router = router.route(
            &protection.path(),
            post(move |state: State<Arc<SsrfState>>, ValidJson(request): ValidJson<models::FetchRequest>| {
                handlers::protected(state, protection, request)
            }),
        );
    }

    Ok(router.with_state(state))
}
