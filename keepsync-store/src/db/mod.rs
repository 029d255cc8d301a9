//! Database layer - connection pool, migrations and repositories

mod decode;
pub mod migrations;
pub mod pool;
pub mod repos;
mod statements;

pub use migrations::MIGRATOR;
pub use pool::create_pool;
pub use repos::*;
