//! Schema migrations
//!
//! The workspace `migrations/` directory is embedded at build time. A runtime
//! directory can replace it (`StoreConfig::migrations_dir`), which is how
//! deployments ship schema changes without rebuilding.

use std::path::Path;

use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::error::Result;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Apply pending migrations from `dir`, or the embedded set when `None`.
pub async fn run(pool: &PgPool, dir: Option<&Path>) -> Result<()> {
    match dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "running migrations from directory");
            let migrator = Migrator::new(dir).await?;
            migrator.run(pool).await?;
        }
        None => {
            tracing::info!(count = MIGRATOR.iter().count(), "running embedded migrations");
            MIGRATOR.run(pool).await?;
        }
    }

    tracing::info!("migrations complete");
    Ok(())
}
