//! Structured span field names recorded after a span is entered.
//!
//! Spans declare these fields as `tracing::field::Empty` and fill them in
//! with `Span::record` once the value is known.

/// Storage: rows written by a batch.
pub const ROWS_WRITTEN: &str = "rows_written";

/// Storage: rows deleted by a batch before insertion.
pub const ROWS_DELETED: &str = "rows_deleted";

/// Storage: batch write time in milliseconds.
pub const BATCH_WRITE_TIME: &str = "batch_write_time";

/// Jobs: units processed by a run.
pub const UNITS_PROCESSED: &str = "units_processed";
