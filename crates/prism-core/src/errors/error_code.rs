//! PrismErrorCode trait for the machine-readable run summary.

/// Every error enum provides a stable code string so the run summary can be
/// filtered without parsing messages.
pub trait PrismErrorCode {
    /// Returns the error code string (e.g., "FIT_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted summary string: `[ERROR_CODE] message`.
    fn summary_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";
pub const FIT_ERROR: &str = "FIT_ERROR";
pub const NON_CONVERGENCE: &str = "NON_CONVERGENCE";
