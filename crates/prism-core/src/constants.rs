//! Shared constants for the PRISM psychometrics engine.

/// Minimum complete-case respondents before any statistic is computed.
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 50;

/// Minimum items for the reliability estimators.
pub const DEFAULT_MIN_ITEMS: usize = 2;

/// Minimum items for a single-factor fit (1-2 item models are unidentified).
pub const DEFAULT_MIN_ITEMS_FOR_CFA: usize = 3;

/// Minimum common scales before a retest correlation is computed.
pub const DEFAULT_MIN_COMMON_SCALES: usize = 3;

/// Default number of random splits for split-half reliability.
pub const DEFAULT_SPLIT_HALF_ITERATIONS: usize = 200;

/// Default PRNG seed for split-half reliability.
pub const DEFAULT_SPLIT_HALF_SEED: u64 = 42;

/// Default lowest point of the response scale (used for reverse keying).
pub const DEFAULT_RESPONSE_MIN: f64 = 1.0;

/// Default highest point of the response scale (used for reverse keying).
pub const DEFAULT_RESPONSE_MAX: f64 = 5.0;

/// Scale code written on retest rows that aggregate over every common scale.
pub const AGGREGATE_SCALE_CODE: &str = "ALL_SCALES";

/// Session status that marks a finished assessment.
pub const COMPLETED_STATUS: &str = "completed";

/// Decimal places kept for persisted reliability and correlation values.
pub const PERSISTED_DECIMALS: i32 = 4;

/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "prism.toml";
