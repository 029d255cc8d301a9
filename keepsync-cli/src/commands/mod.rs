//! Command implementations for the keepsync CLI

pub mod records;
pub mod system;
pub mod users;

pub use records::run_records;
pub use system::{run_migrate, run_ping, run_tables};
pub use users::run_users;

use anyhow::{Context, Result};
use keepsync_store::{Keeper, OpContext, StoreConfig};

/// Context cancelled on Ctrl-C.
pub(crate) fn interrupt_context() -> OpContext {
    let ctx = OpContext::background();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });
    ctx
}

/// Open the store, applying migrations per the configured policy.
pub(crate) async fn open_keeper(config: &StoreConfig) -> Result<Keeper> {
    Keeper::connect(config)
        .await
        .context("Failed to open keepsync store")
}
