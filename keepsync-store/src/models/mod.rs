//! Domain models for the record engine
//!
//! Caller input is validated here, before any statement is assembled.

mod record;
mod shapes;
mod table;
mod user;
mod validation;

pub use record::{format_timestamp, Fields, Record};
pub use shapes::{BinaryBlob, Card, Credential, RecordShape, SyncMeta, TextNote};
pub use table::{is_catalog_identifier, quote_ident, RecordTable, CONVENTION_COLUMNS};
pub use user::{User, UserId, Username};
pub use validation::ValidationError;
