//! Insecure direct object reference.
//!
//! Every route authenticates with HTTP Basic; they differ only in the
//! [`AccessPolicy`] applied once the caller is known. The vulnerable route
//! serves any existing document to any authenticated user.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{get, post},
    Router,
};

use crate::config::IdorConfig;

pub use auth::Authenticated;
pub use handlers::IdorState;
pub use models::DocumentId;
pub use policy::AccessPolicy;
pub use store::DocumentStore;

/// Build the `/idor` router over the seeded store.
pub fn router(config: &IdorConfig) -> Router {
    router_with_store(config, DocumentStore::seeded())
}

/// Build the `/idor` router over a caller-provided store.
pub fn router_with_store(config: &IdorConfig, store: DocumentStore) -> Router {
    let state = Arc::new(IdorState {
        store,
        realm: config.realm.clone(),
    });

    let mut router = Router::new().route("/", get(handlers::index));

    for policy in [
        AccessPolicy::Unchecked,
        AccessPolicy::DirectAuth,
        AccessPolicy::Acl,
        AccessPolicy::QueryFilter,
        AccessPolicy::SessionBased,
        AccessPolicy::Abac,
    ] {
        router = router.route(
            &policy.path(),
            get(
                move |State(state): State<Arc<IdorState>>,
                      user: Authenticated,
                      doc_id: Result<Path<DocumentId>, PathRejection>| {
                    handlers::get_document_by_id(state, policy, user, doc_id)
                },
            ),
        );
    }

    router
        .route(&AccessPolicy::Obfuscated.path(), get(handlers::get_obfuscated_document))
        .route(&AccessPolicy::Token.path(), get(handlers::get_token_document))
        .route(
            "/secure/token-based/document/{doc_id}/generate-token",
            post(handlers::generate_token),
        )
        .with_state(state)
}
