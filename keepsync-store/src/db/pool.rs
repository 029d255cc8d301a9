//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::error::{KeeperError, Result};

/// Create a PostgreSQL connection pool from validated settings.
///
/// # Errors
///
/// `Configuration` for an empty DSN or zero pool size, `ConnectionFailed`
/// if the first connection cannot be established, `IoFailure` if the DSN
/// cannot be parsed.
pub async fn create_pool(config: &StoreConfig) -> Result<PgPool> {
    config.validate()?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.database_url)
        .await
        .map_err(|err| match err {
            sqlx::Error::Configuration(source) => {
                KeeperError::Configuration(format!("invalid dsn: {}", source))
            }
            other => KeeperError::from_sqlx("connect", other),
        })
}
