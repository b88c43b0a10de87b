//! HTTP handlers for the SSRF routes.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::error::LabError;
use crate::mitigation::validation::ValidJson;
use crate::mitigation::Rejection;
use crate::observability::metrics::{record_outcome, Outcome};
use crate::ssrf::mitigations::{Outbound, Protection, SsrfPolicy};
use crate::ssrf::models::{FetchRequest, FetchResponse};
use crate::ssrf::primitive::{self, FetchError};

const MODULE: &str = "ssrf";

#[derive(Debug)]
pub struct SsrfState {
    pub policy: SsrfPolicy,
    pub client: reqwest::Client,
}

/// `POST /vulnerable/ssrf`
pub async fn vulnerable(
    State(state): State<Arc<SsrfState>>,
    ValidJson(request): ValidJson<FetchRequest>,
) -> Result<Json<FetchResponse>, LabError> {
    send(&state, "vulnerable", Outbound::unchecked(&request)).await
}

/// `POST /protected/{protection}`
pub async fn protected(
    State(state): State<Arc<SsrfState>>,
    protection: Protection,
    request: FetchRequest,
) -> Result<Json<FetchResponse>, LabError> {
    let outbound = match state.policy.check(protection, &request).await {
        Ok(outbound) => outbound,
        Err(rejection) => {
            tracing::warn!(
                protection = protection.as_str(),
                url = %request.url,
                method = request.method.as_str(),
                reason = %rejection.reason,
                "Outbound request blocked"
            );
            record_outcome(MODULE, protection.as_str(), Outcome::Rejected);
            return Err(rejection.into());
        }
    };
    send(&state, protection.as_str(), outbound).await
}

async fn send(
    state: &SsrfState,
    strategy: &'static str,
    outbound: Outbound,
) -> Result<Json<FetchResponse>, LabError> {
    tracing::info!(
        strategy,
        url = %outbound.url,
        method = outbound.method.as_str(),
        "Issuing outbound request"
    );

    match primitive::fetch(&state.client, &outbound).await {
        Ok(result) => {
            record_outcome(MODULE, strategy, Outcome::Allowed);
            Ok(Json(FetchResponse { result }))
        }
        Err(FetchError::Timeout) => {
            tracing::warn!(strategy, url = %outbound.url, "Outbound request timed out");
            record_outcome(MODULE, strategy, Outcome::Rejected);
            Err(Rejection::new(strategy, FetchError::Timeout.to_string()).into())
        }
        Err(FetchError::Request(message)) => {
            tracing::warn!(strategy, url = %outbound.url, error = %message, "Outbound request failed");
            record_outcome(MODULE, strategy, Outcome::Failed);
            Err(LabError::Execution(message))
        }
    }
}
