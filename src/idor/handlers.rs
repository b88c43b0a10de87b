//! HTTP handlers for the IDOR routes.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::error::LabError;
use crate::idor::auth::Authenticated;
use crate::idor::models::{deobfuscate_id, DocumentId, DocumentResponse, TokenQuery, TokenResponse};
use crate::idor::policy::{may_issue_token, AccessPolicy};
use crate::idor::store::DocumentStore;
use crate::observability::metrics::{record_outcome, Outcome};

const MODULE: &str = "idor";

#[derive(Debug)]
pub struct IdorState {
    pub store: DocumentStore,
    pub realm: String,
}

/// `GET /`
pub async fn index() -> Json<Value> {
    let secure: serde_json::Map<String, Value> = AccessPolicy::ALL
        .iter()
        .filter(|p| **p != AccessPolicy::Unchecked)
        .map(|p| (p.as_str().replace('-', "_"), json!(p.path())))
        .collect();

    Json(json!({
        "message": "IDOR Demo API",
        "endpoints": {
            "vulnerable": AccessPolicy::Unchecked.path(),
            "secure_methods": secure,
        }
    }))
}

/// Document read under `policy`.
pub async fn get_document(
    state: Arc<IdorState>,
    policy: AccessPolicy,
    user: Authenticated,
    doc_id: DocumentId,
    token: Option<&str>,
) -> Result<Json<DocumentResponse>, LabError> {
    let Authenticated(user) = user;
    match policy.authorize(&state.store, &user, doc_id, token) {
        Ok(document) => {
            tracing::info!(policy = policy.as_str(), user = %user.username, doc_id, "Document served");
            record_outcome(MODULE, policy.as_str(), Outcome::Allowed);
            Ok(Json(document.into()))
        }
        Err(e) => {
            tracing::warn!(
                policy = policy.as_str(),
                user = %user.username,
                doc_id,
                error = %e,
                "Document access refused"
            );
            record_outcome(MODULE, policy.as_str(), Outcome::Rejected);
            Err(e)
        }
    }
}

/// Document read by numeric id under `policy`.
pub async fn get_document_by_id(
    state: Arc<IdorState>,
    policy: AccessPolicy,
    user: Authenticated,
    doc_id: Result<Path<DocumentId>, PathRejection>,
) -> Result<Json<DocumentResponse>, LabError> {
    let Path(doc_id) = doc_id?;
    get_document(state, policy, user, doc_id, None).await
}

/// `GET /secure/obfuscation/document/{obfuscated_id}`
pub async fn get_obfuscated_document(
    State(state): State<Arc<IdorState>>,
    user: Authenticated,
    Path(obfuscated_id): Path<String>,
) -> Result<Json<DocumentResponse>, LabError> {
    let doc_id = deobfuscate_id(&obfuscated_id)
        .ok_or_else(|| LabError::Malformed("Invalid document ID".to_string()))?;
    get_document(state, AccessPolicy::Obfuscated, user, doc_id, None).await
}

/// `GET /secure/token-based/document/{doc_id}?access_token=`
pub async fn get_token_document(
    State(state): State<Arc<IdorState>>,
    user: Authenticated,
    doc_id: Result<Path<DocumentId>, PathRejection>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<DocumentResponse>, LabError> {
    let Path(doc_id) = doc_id?;
    let Query(query) = query?;
    get_document(state, AccessPolicy::Token, user, doc_id, Some(&query.access_token)).await
}

/// `POST /secure/token-based/document/{doc_id}/generate-token`
pub async fn generate_token(
    State(state): State<Arc<IdorState>>,
    Authenticated(user): Authenticated,
    doc_id: Result<Path<DocumentId>, PathRejection>,
) -> Result<Json<TokenResponse>, LabError> {
    let Path(doc_id) = doc_id?;
    let access_token = state
        .store
        .issue_token(doc_id, &user, |document| may_issue_token(&user, document))
        .ok_or_else(|| LabError::NotFound("Document not found".to_string()))??;

    tracing::info!(user = %user.username, doc_id, "Access token issued");
    Ok(Json(TokenResponse { access_token }))
}
