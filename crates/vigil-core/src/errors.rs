//! Error taxonomy for the persistence layer.

use thiserror::Error;

/// Errors surfaced by the store.
///
/// Execution failures are always an `Err`, distinguishable from the
/// zero-rows cases (`Ok(0)`, `Ok(None)`, an empty `Vec`).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record type for table {table} declares no persisted columns")]
    NoColumns { table: String },

    #[error("identity column {column} is not a persisted column of {table}")]
    MissingIdentity { table: String, column: String },

    #[error("column {column} missing from result row")]
    MissingColumn { column: String },

    #[error("column {column} holds {found}, expected {expected}")]
    ColumnType {
        column: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("database error: {message}")]
    Database { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
