//! Login bodies, strategies and the response envelope.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login body; absent fields are treated as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Column-length constraints of the typed-mapping routes.
#[derive(Debug, Clone, Validate)]
pub struct BoundedLogin {
    #[validate(length(max = 50, message = "Username too long"))]
    pub username: String,
    #[validate(length(max = 100, message = "Password too long"))]
    pub password: String,
}

impl From<&LoginRequest> for BoundedLogin {
    fn from(login: &LoginRequest) -> Self {
        Self {
            username: login.username.clone(),
            password: login.password.clone(),
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

impl LoginResponse {
    pub fn logged_in() -> Self {
        Self {
            status: Status::Success,
            message: "Logged in".to_string(),
            user: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            user: None,
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::error("Invalid credentials")
    }
}

/// How a login route talks to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlStrategy {
    /// Vulnerable: `format!` into the query text.
    StringFormat,
    /// Vulnerable: concatenation into the query text.
    SqliteConcatenate,
    Parameterized,
    Orm,
    QueryBuilder,
    InputValidation,
    StoredProcedure,
    ReadonlyUser,
    Combined,
}

impl SqlStrategy {
    pub const ALL: [SqlStrategy; 9] = [
        SqlStrategy::StringFormat,
        SqlStrategy::SqliteConcatenate,
        SqlStrategy::Parameterized,
        SqlStrategy::Orm,
        SqlStrategy::QueryBuilder,
        SqlStrategy::InputValidation,
        SqlStrategy::StoredProcedure,
        SqlStrategy::ReadonlyUser,
        SqlStrategy::Combined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlStrategy::StringFormat => "string_format",
            SqlStrategy::SqliteConcatenate => "sqlite_concatenate",
            SqlStrategy::Parameterized => "parameterized",
            SqlStrategy::Orm => "orm",
            SqlStrategy::QueryBuilder => "query_builder",
            SqlStrategy::InputValidation => "input_validation",
            SqlStrategy::StoredProcedure => "stored_procedure",
            SqlStrategy::ReadonlyUser => "readonly_user",
            SqlStrategy::Combined => "combined",
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(self, SqlStrategy::StringFormat | SqlStrategy::SqliteConcatenate)
    }

    /// Route below `/sqli`.
    pub fn path(&self) -> String {
        if self.is_vulnerable() {
            format!("/insecure/login_{}", self.as_str())
        } else {
            format!("/secure/login_{}", self.as_str())
        }
    }
}
