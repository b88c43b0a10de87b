//! OS command injection.
//!
//! `/vulnerable/exec` hands the client's text to `sh -c`. Each secure route
//! applies one [`Strategy`] before anything is executed; `command_mapping`
//! never accepts free text at all.
//!
//! # Data Flow
//! ```text
//! {"command": ...}
//!     → models.rs (serde + validator: non-blank)
//!     → mitigations.rs (Strategy → Plan or Rejection)
//!     → primitive.rs (spawn, capture stdout/stderr/returncode)
//! ```

pub mod handlers;
pub mod mitigations;
pub mod models;
pub mod primitive;

use std::sync::Arc;

use axum::{extract::State, routing::post, Router};

use crate::config::CommandInjectionConfig;
use crate::mitigation::validation::ValidJson;

pub use handlers::CmdiState;
pub use mitigations::{CommandPolicy, Invocation, Strategy};

/// Build the `/cmdi` router.
pub fn router(config: &CommandInjectionConfig) -> Router {
    let state = Arc::new(CmdiState {
        policy: CommandPolicy::new(config),
    });

    let mut router = Router::new();
    for strategy in Strategy::ALL {
        router = router.route(
            &strategy.path(),
            post(move |state: State<Arc<CmdiState>>, ValidJson(request): ValidJson<models::CommandRequest>| {
                handlers::run_strategy(state, strategy, request)
            }),
        );
    }

    router
        .route("/secure/command_mapping", post(handlers::command_mapping))
        .with_state(state)
}
