//! SQLite storage bootstrap, migrations and transaction scoping.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the task-list core.
//! - Apply schema migrations in deterministic order.
//! - Provide the scoped transaction helpers used by repository writes and
//!   multi-statement reads.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write task data before migrations succeed.
//! - A scoped transaction either commits fully or rolls back fully.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod transaction;

pub use open::{open_db, open_db_in_memory};
pub use transaction::{run_in_transaction, run_read_transaction};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
