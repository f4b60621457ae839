//! Storage errors.

use super::error_code::{self, PrismErrorCode};

/// Errors raised by the store adapter. Fatal for the batch in progress;
/// batches committed earlier in the run stay committed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Constraint violation on {table}: {message}")]
    ConstraintViolation { table: String, message: String },
}

impl PrismErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::ConstraintViolation { .. } => error_code::CONSTRAINT_VIOLATION,
        }
    }
}
