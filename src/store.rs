//! SQLite connection pool.

use crate::error::{AppError, ConfigError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// Open a pool for `database_url`, creating the database file if missing.
///
/// In-memory databases live only as long as their connection, so they get a single
/// connection that is never recycled. Engine-level foreign key enforcement stays off:
/// related rows are checked on write by the record validator, and deletes do not cascade.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ConfigError::Load(format!("invalid database url '{}': {}", database_url, e)))?
        .create_if_missing(true)
        .foreign_keys(false);

    let pool = if is_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(opts)
            .await?
    };
    tracing::info!(database = %database_url, "database connected");
    Ok(pool)
}

/// Liveness check used by `/ready`.
pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
