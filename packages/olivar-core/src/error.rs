//! Record store error types.

use thiserror::Error;

/// Record store operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Table name not known to the schema registry
    #[error("Table '{table}' not found")]
    UnknownTable { table: String },

    /// Identifier or position does not resolve to a record
    #[error("Record {reference} not found in table '{table}'")]
    NotFound { table: String, reference: String },

    /// Value cannot be converted to the column's type
    #[error("Invalid value for field '{column}' in table '{table}': {reason}")]
    InvalidField {
        table: String,
        column: String,
        reason: String,
    },

    /// Every identifier the column can represent is already taken
    #[error("No identifier left for column '{column}' in table '{table}'")]
    IdentifiersExhausted { table: String, column: String },

    /// Column not part of the table's current schema
    #[error("Field '{field}' not found in table '{table}'")]
    FieldNotFound { table: String, field: String },

    /// Table already registered
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Schema definition rejected at registration
    #[error("Invalid schema for table '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    /// Workbook file could not be parsed or serialized
    #[error("Workbook format error: {0}")]
    WorkbookFormat(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl StoreError {
    /// Returns true for errors raised while reading or writing the workbook file.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            StoreError::WorkbookFormat(_)
                | StoreError::DiskFull(_)
                | StoreError::IoError(_)
                | StoreError::TransientIoError(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
