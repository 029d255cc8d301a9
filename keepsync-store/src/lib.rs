//! keepsync-store: schema-driven record storage for the keepsync sync backend
//!
//! A [`Keeper`] owns the Postgres pool. Two repositories borrow it:
//! - [`UserRepo`] registers users and resolves usernames to ids
//! - [`RecordRepo`] adds, updates, soft-deletes and incrementally reads
//!   records of the allow-listed [`RecordTable`]s
//!
//! Every operation takes an [`OpContext`] carrying cancellation and an
//! optional deadline.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
mod keeper;
pub mod models;

pub use config::{MigrationPolicy, StoreConfig};
pub use context::OpContext;
pub use db::{RecordRepo, UserRepo, MIGRATOR};
pub use error::{KeeperError, Result};
pub use keeper::{DataSource, Keeper};
pub use models::{
    BinaryBlob, Card, Credential, Fields, Record, RecordShape, RecordTable, SyncMeta, TextNote,
    User, UserId, Username, ValidationError,
};
