//! Error handling for PRISM.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod estimation_error;
pub mod job_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use error_code::PrismErrorCode;
pub use estimation_error::EstimationError;
pub use job_error::JobError;
pub use storage_error::StorageError;
