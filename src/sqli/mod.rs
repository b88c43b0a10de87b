//! SQL injection.
//!
//! Two login routes splice the client's text into the query. The secure
//! routes bind parameters, layer input checks on top, run on a read-only
//! connection or sit behind a request filter.
//!
//! # Data Flow
//! ```text
//! {"username", "password"}
//!     → [waf.rs, combined route only]
//!     → mitigations.rs (length, allowlist, keywords)
//!     → db.rs (sqlx SQLite pool)
//! ```

pub mod db;
pub mod handlers;
pub mod mitigations;
pub mod models;
pub mod waf;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use thiserror::Error;

use crate::config::SqlInjectionConfig;

pub use db::Database;
pub use handlers::SqliState;
pub use models::SqlStrategy;

#[derive(Debug, Error)]
pub enum SqliSetupError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("sqli.allowed_chars: {0}")]
    Pattern(#[from] regex::Error),
}

/// Open the database and build the `/sqli` router.
pub async fn router(config: &SqlInjectionConfig) -> Result<Router, SqliSetupError> {
    let db = Database::connect(Path::new(&config.database_path)).await?;
    router_with_database(config, db)
}

pub fn router_with_database(
    config: &SqlInjectionConfig,
    db: Database,
) -> Result<Router, SqliSetupError> {
    let state = Arc::new(SqliState {
        db,
        policy: mitigations::InputPolicy::new(config)?,
    });

    let mut router = Router::new().route("/", get(handlers::index));
    for strategy in SqlStrategy::ALL {
        let route = post(
            move |state: State<Arc<SqliState>>, login: Result<Json<models::LoginRequest>, JsonRejection>| async move {
                let login = match login {
                    Ok(Json(login)) => login,
                    Err(rejection) => return handlers::malformed(rejection),
                };
                if strategy.is_vulnerable() {
                    handlers::insecure_login(state, strategy, login).await
                } else {
                    handlers::secure_login(state, strategy, login).await
                }
            },
        );
        let route = if strategy == SqlStrategy::Combined {
            route.layer(middleware::from_fn_with_state(state.clone(), waf::waf))
        } else {
            route
        };
        router = router.route(&strategy.path(), route);
    }

    // Older name of the query builder route.
    router = router.route(
        "/secure/login_peewee",
        post(
            |state: State<Arc<SqliState>>, login: Result<Json<models::LoginRequest>, JsonRejection>| async move {
                match login {
                    Ok(Json(login)) => handlers::secure_login(state, SqlStrategy::QueryBuilder, login).await,
                    Err(rejection) => handlers::malformed(rejection),
                }
            },
        ),
    );

    Ok(router.with_state(state))
}
