//! HTTP handlers for the SQL injection routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::mitigation::validation::first_message;
use crate::observability::logging::SECURITY_TARGET;
use crate::observability::metrics::{record_outcome, Outcome};
use crate::sqli::db::{self, Database, AUTHENTICATE_USER};
use crate::sqli::mitigations::{self, InputPolicy};
use crate::sqli::models::{BoundedLogin, LoginRequest, LoginResponse, SqlStrategy, UserResponse, UserRow};

const MODULE: &str = "sqli";

/// Shared state of the SQL injection routes.
#[derive(Debug)]
pub struct SqliState {
    pub db: Database,
    pub policy: InputPolicy,
}

type Reply = (StatusCode, Json<LoginResponse>);

fn reply(status: StatusCode, body: LoginResponse) -> Reply {
    (status, Json(body))
}

fn rejected(strategy: SqlStrategy, message: impl Into<String>) -> Reply {
    let message = message.into();
    tracing::warn!(
        target: SECURITY_TARGET,
        strategy = strategy.as_str(),
        reason = %message,
        "Login input rejected"
    );
    record_outcome(MODULE, strategy.as_str(), Outcome::Rejected);
    reply(StatusCode::BAD_REQUEST, LoginResponse::error(message))
}

fn internal(strategy: SqlStrategy, error: &sqlx::Error, message: &str) -> Reply {
    tracing::error!(strategy = strategy.as_str(), error = %error, "Login query failed");
    record_outcome(MODULE, strategy.as_str(), Outcome::Failed);
    reply(StatusCode::INTERNAL_SERVER_ERROR, LoginResponse::error(message))
}

fn lookup_result(strategy: SqlStrategy, row: Option<UserRow>) -> Reply {
    record_outcome(MODULE, strategy.as_str(), Outcome::Allowed);
    match row {
        Some(row) => {
            tracing::info!(strategy = strategy.as_str(), username = %row.username, "Login succeeded");
            reply(StatusCode::OK, LoginResponse::logged_in())
        }
        None => reply(StatusCode::OK, LoginResponse::invalid_credentials()),
    }
}

/// A body that did not deserialize into a login, answered in the login envelope.
pub fn malformed(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection.body_text(), "Login body rejected");
    reply(StatusCode::BAD_REQUEST, LoginResponse::error(rejection.body_text())).into_response()
}

/// `GET /` lists the login routes.
pub async fn index() -> Json<serde_json::Value> {
    let (insecure, secure): (Vec<SqlStrategy>, Vec<SqlStrategy>) =
        SqlStrategy::ALL.into_iter().partition(|s| s.is_vulnerable());
    Json(serde_json::json!({
        "insecure": insecure.iter().map(|s| format!("/sqli{}", s.path())).collect::<Vec<_>>(),
        "secure": secure.iter().map(|s| format!("/sqli{}", s.path())).collect::<Vec<_>>(),
    }))
}

/// Login with query text built from the request.
pub async fn insecure_login(
    State(state): State<Arc<SqliState>>,
    strategy: SqlStrategy,
    login: LoginRequest,
) -> Response {
    let query = match strategy {
        SqlStrategy::SqliteConcatenate => mitigations::concatenate_query(&login),
        _ => mitigations::format_query(&login),
    };
    tracing::info!(strategy = strategy.as_str(), query = %query, "Executing login query");

    match db::raw_login(&state.db.pool, &query).await {
        Ok(true) => {
            record_outcome(MODULE, strategy.as_str(), Outcome::Allowed);
            reply(StatusCode::OK, LoginResponse::logged_in()).into_response()
        }
        Ok(false) => {
            record_outcome(MODULE, strategy.as_str(), Outcome::Allowed);
            reply(StatusCode::OK, LoginResponse::invalid_credentials()).into_response()
        }
        Err(e) => {
            tracing::warn!(
                target: SECURITY_TARGET,
                strategy = strategy.as_str(),
                error = %e,
                "Login query raised a database error"
            );
            record_outcome(MODULE, strategy.as_str(), Outcome::Failed);
            // The raw driver message is part of what this route demonstrates.
            reply(StatusCode::INTERNAL_SERVER_ERROR, LoginResponse::error(e.to_string()))
                .into_response()
        }
    }
}

/// Login through one of the bound-parameter strategies.
pub async fn secure_login(
    State(state): State<Arc<SqliState>>,
    strategy: SqlStrategy,
    login: LoginRequest,
) -> Response {
    let pool = &state.db.pool;
    let (user, pass) = (login.username.as_str(), login.password.as_str());

    let reply = match strategy {
        SqlStrategy::Parameterized => match db::parameterized_login(pool, user, pass).await {
            Ok(row) => lookup_result(strategy, row),
            Err(e) => internal(strategy, &e, "Internal server error"),
        },
        SqlStrategy::Orm => {
            if let Err(errors) = BoundedLogin::from(&login).validate() {
                return rejected(strategy, first_message(&errors)).into_response();
            }
            match db::parameterized_login(pool, user, pass).await {
                Ok(row) => lookup_result(strategy, row),
                Err(e) => internal(strategy, &e, "Internal server error"),
            }
        }
        SqlStrategy::QueryBuilder => match db::query_builder_login(pool, user, pass).await {
            Ok(row) => lookup_result(strategy, row),
            Err(e) => internal(strategy, &e, "Internal server error"),
        },
        SqlStrategy::InputValidation => {
            if let Err(errors) = state.policy.validate(&login) {
                return rejected(strategy, first_message(&errors)).into_response();
            }
            match db::parameterized_login(pool, user, pass).await {
                Ok(row) => lookup_result(strategy, row),
                Err(e) => internal(strategy, &e, "Internal server error"),
            }
        }
        SqlStrategy::StoredProcedure => match db::call(pool, AUTHENTICATE_USER, user, pass).await {
            Ok(row) => lookup_result(strategy, row),
            Err(e) => internal(strategy, &e, "Authentication failed"),
        },
        SqlStrategy::ReadonlyUser => {
            if let Err(errors) = state.policy.validate(&login) {
                return rejected(strategy, first_message(&errors)).into_response();
            }
            match db::parameterized_login(&state.db.readonly, user, pass).await {
                Ok(row) => lookup_result(strategy, row),
                Err(e) => internal(strategy, &e, "Database operation not permitted"),
            }
        }
        SqlStrategy::Combined => return combined_login(&state, login).await.into_response(),
        SqlStrategy::StringFormat | SqlStrategy::SqliteConcatenate => {
            return insecure_login(State(state.clone()), strategy, login).await;
        }
    };
    reply.into_response()
}

/// Validation, keyword screening and a typed lookup that returns the user.
async fn combined_login(state: &SqliState, login: LoginRequest) -> Reply {
    let strategy = SqlStrategy::Combined;
    if let Err(errors) = state.policy.validate(&login) {
        return rejected(strategy, first_message(&errors));
    }
    if let Some(keyword) = state.policy.keyword_in(&login.username) {
        tracing::warn!(target: SECURITY_TARGET, keyword, "SQL keyword in username");
        return rejected(strategy, "Invalid username");
    }

    match db::parameterized_login(&state.db.pool, &login.username, &login.password).await {
        Ok(Some(row)) => {
            record_outcome(MODULE, strategy.as_str(), Outcome::Allowed);
            reply(
                StatusCode::OK,
                LoginResponse {
                    user: Some(UserResponse::from(row)),
                    ..LoginResponse::logged_in()
                },
            )
        }
        Ok(None) => lookup_result(strategy, None),
        Err(e) => internal(strategy, &e, "Internal server error"),
    }
}
