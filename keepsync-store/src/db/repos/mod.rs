//! Repository implementations for database access
//!
//! Each repository borrows the pool owned by [`crate::Keeper`] and follows these patterns:
//! - One statement per call, no multi-statement transactions
//! - Values are always bound, identifiers come from the allow-list
//! - Rely on DB constraints, handle violations - no check-then-insert

pub mod records;
pub mod users;

pub use records::RecordRepo;
pub use users::UserRepo;
