//! Query modules, one per table family. Free functions over `&Connection`.

pub mod responses;
pub mod results;
pub mod retest;
pub mod scales;
pub mod source;

use prism_core::errors::StorageError;
use rusqlite::types::Value;
use rusqlite::ErrorCode;

/// Max host parameters bound per statement when expanding `IN (...)` lists.
pub(crate) const MAX_BOUND_PARAMS: usize = 500;

/// Map a rusqlite error, surfacing constraint failures on `table`.
pub(crate) fn sqlite_error(table: &str, e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StorageError::ConstraintViolation {
            table: table.to_string(),
            message: e.to_string(),
        },
        _ => StorageError::SqliteError {
            message: e.to_string(),
        },
    }
}

/// `?, ?, ?` for `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub(crate) fn int_values(ids: impl IntoIterator<Item = i64>) -> Vec<Value> {
    ids.into_iter().map(Value::Integer).collect()
}

pub(crate) fn count_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub(crate) fn count_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
    }
}
