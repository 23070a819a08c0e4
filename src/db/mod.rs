pub mod kv;
pub mod sqlite;

pub use kv::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}
