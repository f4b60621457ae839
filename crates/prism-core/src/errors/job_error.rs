//! Job errors: everything a run can fail with, via `From` conversions.

use super::error_code::PrismErrorCode;
use super::{ConfigError, EstimationError, StorageError};

/// Errors that can occur while a job runs.
///
/// `Estimation` is per unit and only counted; `Config` and `Storage` are fatal.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),
}

impl JobError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Estimation(_))
    }
}

impl PrismErrorCode for JobError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Estimation(e) => e.error_code(),
        }
    }
}
