//! Cross-site scripting.
//!
//! Every route takes the same form and renders the `input` field back.
//! `/vulnerable` inserts it verbatim; the other routes escape, strip,
//! allowlist, change the content type, or harden the response around it.
//!
//! # Data Flow
//! ```text
//! input=...&xss_type=...
//!     → models.rs (serde + validator: 1..=500 chars, known xss_type)
//!     → mitigations.rs (escape / strip / whitelist)
//!     → render.rs (result page, text escaped unless trusted)
//! ```

pub mod handlers;
pub mod mitigations;
pub mod models;
pub mod render;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::InvalidHeaderValue, HeaderValue},
    routing::{get, post},
    Router,
};

use crate::config::XssConfig;
use crate::mitigation::validation::ValidForm;
use crate::security::SecureHeaders;

pub use handlers::XssState;
pub use models::XssType;

/// Build the `/xss` router.
pub fn router(config: &XssConfig) -> Result<Router, InvalidHeaderValue> {
    let state = Arc::new(XssState {
        csp_headers: SecureHeaders::with_csp(&config.content_security_policy)?,
        session_cookie: HeaderValue::from_str(&format!(
            "session_token={}; HttpOnly; Secure; SameSite=Strict; Path=/",
            config.session_token
        ))?,
    });

    let mut router = Router::new().route("/", get(handlers::index));
    for route in XssType::ALL {
        router = router.route(
            route.path(),
            post(move |state: State<Arc<XssState>>, ValidForm(input): ValidForm<models::UserInput>| {
                handlers::render_route(state, route, input)
            }),
        );
    }

    Ok(router.with_state(state))
}
