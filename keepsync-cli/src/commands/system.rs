//! Store health and schema commands
//!
//! Commands: ping, migrate, tables

use anyhow::{bail, Context, Result};
use keepsync_store::db::create_pool;
use keepsync_store::{Keeper, RecordTable, StoreConfig};

use super::{interrupt_context, open_keeper};

/// Probe the database without touching the schema.
pub async fn run_ping(config: &StoreConfig) -> Result<()> {
    let keeper = match create_pool(config).await {
        Ok(pool) => Keeper::from_pool(pool),
        Err(err) if err.is_transient() => {
            println!("unreachable");
            bail!("database unreachable: {}", err);
        }
        Err(err) => return Err(err).context("Failed to connect to database"),
    };

    let alive = keeper.ping().await;
    keeper.close().await;

    if !alive {
        println!("unreachable");
        bail!("database unreachable");
    }
    println!("ok");
    Ok(())
}

/// Apply migrations, failing on the first error regardless of the configured policy.
pub async fn run_migrate(config: &StoreConfig) -> Result<()> {
    let pool = create_pool(config)
        .await
        .context("Failed to connect to database")?;
    let keeper = Keeper::from_pool(pool);

    let result = keeper
        .migrate(config.migrations_dir.as_deref())
        .await
        .context("Migration failed");
    keeper.close().await;
    result?;

    println!("migrations applied");
    Ok(())
}

/// List allow-listed tables with the columns the live catalog reports.
pub async fn run_tables(config: &StoreConfig) -> Result<()> {
    let keeper = open_keeper(config).await?;
    let ctx = interrupt_context();

    for table in RecordTable::ALL {
        match keeper.records().table_columns(&ctx, table).await {
            Ok(columns) => println!("{}: {}", table, columns.join(", ")),
            Err(err) => println!("{}: {}", table, err),
        }
    }

    keeper.close().await;
    Ok(())
}
