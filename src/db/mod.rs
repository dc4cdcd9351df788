pub mod sqlite;
pub mod store;

pub use sqlite::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Stored payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid timestamp in {table}: {value}")]
    InvalidTimestamp { table: &'static str, value: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}
