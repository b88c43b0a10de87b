//! SQLite access: pool setup, seeding and the login queries.
//!
//! Two pools share one database file: a read-write pool used by every route
//! and a `read_only` pool used by the least-privilege route.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};

use crate::sqli::models::UserRow;

/// Seed users: username, email, password.
pub const SEED_USERS: &[(&str, &str, &str)] = &[
    ("admin", "admin@example.com", "Admin@123"),
    ("alice", "alice@example.com", "Alice@123"),
    ("bob", "bob@example.com", "Bob@123"),
    ("testuser", "test@example.com", "Test@123"),
];

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT,
    password TEXT
)";

/// A statement stored under a name and only ever called with bound
/// arguments. SQLite has no stored procedures; this is the closest shape.
#[derive(Debug, Clone, Copy)]
pub struct StoredProcedure {
    pub name: &'static str,
    sql: &'static str,
}

pub const AUTHENTICATE_USER: StoredProcedure = StoredProcedure {
    name: "authenticate_user",
    sql: "SELECT id, username, email FROM users WHERE username = ?1 AND password = ?2 LIMIT 1",
};

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: SqlitePool,
    pub readonly: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and seed it.
    pub async fn connect(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        setup(&pool).await?;

        let readonly = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(SqliteConnectOptions::new().filename(path).read_only(true))
            .await?;

        Ok(Self { pool, readonly })
    }
}

/// Create the table and insert the seed users if it is empty.
pub async fn setup(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS).execute(pool).await?;

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count == 0 {
        for (username, email, password) in SEED_USERS {
            sqlx::query("INSERT INTO users (username, email, password) VALUES (?, ?, ?)")
                .bind(username)
                .bind(email)
                .bind(password)
                .execute(pool)
                .await?;
        }
        tracing::info!(users = SEED_USERS.len(), "Seeded users table");
    }
    Ok(())
}

/// Run attacker-influenced query text. True when any row comes back.
pub async fn raw_login(pool: &SqlitePool, query: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query(query).fetch_optional(pool).await?.is_some())
}

/// Bound-parameter lookup.
pub async fn parameterized_login(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email FROM users WHERE username = ? AND password = ? LIMIT 1",
    )
    .bind(username)
    .bind(password)
    .fetch_optional(pool)
    .await
}

/// Same lookup assembled with a query builder.
pub async fn query_builder_login(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, username, email FROM users WHERE username = ");
    builder.push_bind(username);
    builder.push(" AND password = ");
    builder.push_bind(password);
    builder.push(" LIMIT 1");

    builder.build_query_as::<UserRow>().fetch_optional(pool).await
}

/// Invoke a stored statement with its two arguments.
pub async fn call(
    pool: &SqlitePool,
    procedure: StoredProcedure,
    first: &str,
    second: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    tracing::debug!(procedure = procedure.name, "Calling stored statement");
    sqlx::query_as::<_, UserRow>(procedure.sql)
        .bind(first)
        .bind(second)
        .fetch_optional(pool)
        .await
}
