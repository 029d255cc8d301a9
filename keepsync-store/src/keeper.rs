//! Connection lifecycle
//!
//! [`Keeper`] owns the pool every repository borrows. It is built either from
//! an injected pool (used as is) or from a DSN, in which case migrations run
//! before the first query according to [`MigrationPolicy`].

use std::path::Path;
use std::time::Duration;

use sqlx::{Connection, PgPool};
use tracing::{info, warn};

use crate::config::{MigrationPolicy, StoreConfig};
use crate::db::{create_pool, migrations, RecordRepo, UserRepo};
use crate::error::{KeeperError, Result};

/// Upper bound for a liveness probe.
const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Where the connection comes from
#[derive(Debug)]
pub enum DataSource {
    /// Build a fresh pool and migrate it
    Dsn(String),
    /// Use a pre-built pool; no migrations are applied
    Pool(PgPool),
}

/// Owner of the store connection pool
#[derive(Debug, Clone)]
pub struct Keeper {
    pool: PgPool,
}

impl Keeper {
    /// Open the store from `source`.
    ///
    /// # Errors
    ///
    /// `Configuration("dsn is empty")` for an empty DSN, `ConnectionFailed`
    /// if the pool cannot connect, `Migration` under
    /// [`MigrationPolicy::FailFast`].
    pub async fn open(source: DataSource, config: &StoreConfig) -> Result<Self> {
        let pool = match source {
            DataSource::Pool(pool) => pool,
            DataSource::Dsn(dsn) => {
                if dsn.trim().is_empty() {
                    info!("database dsn is empty");
                    return Err(KeeperError::Configuration("dsn is empty".into()));
                }

                let config = StoreConfig {
                    database_url: dsn,
                    ..config.clone()
                };
                let pool = match create_pool(&config).await {
                    Ok(pool) => pool,
                    Err(err) => {
                        warn!(error = %err, "unable to connect to database");
                        return Err(err);
                    }
                };
                apply_migrations(&pool, &config).await?;
                pool
            }
        };

        info!("connected to database");
        Ok(Self { pool })
    }

    /// Open from `config.database_url`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        Self::open(DataSource::Dsn(config.database_url.clone()), config).await
    }

    /// Wrap an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply migrations explicitly, failing on the first error.
    pub async fn migrate(&self, dir: Option<&Path>) -> Result<()> {
        migrations::run(&self.pool, dir).await
    }

    /// True if a connection can be acquired and answers within one second.
    pub async fn ping(&self) -> bool {
        let probe = async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        };

        matches!(tokio::time::timeout(PING_TIMEOUT, probe).await, Ok(Ok(())))
    }

    /// Close the pool, waiting for in-flight queries.
    ///
    /// Returns `false` if the pool was already closed.
    pub async fn close(&self) -> bool {
        info!("stop database");
        if self.pool.is_closed() {
            warn!("database pool already closed");
            return false;
        }

        self.pool.close().await;
        info!("all queries completed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn users(&self) -> UserRepo<'_> {
        UserRepo::new(&self.pool)
    }

    pub fn records(&self) -> RecordRepo<'_> {
        RecordRepo::new(&self.pool)
    }
}

async fn apply_migrations(pool: &PgPool, config: &StoreConfig) -> Result<()> {
    match migrations::run(pool, config.migrations_dir.as_deref()).await {
        Ok(()) => Ok(()),
        Err(err) => match config.migration_policy {
            MigrationPolicy::BestEffort => {
                warn!(error = %err, "migrations failed, continuing with the existing schema");
                Ok(())
            }
            MigrationPolicy::FailFast => Err(err),
        },
    }
}
