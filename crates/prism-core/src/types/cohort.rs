//! Half-open cohort date window `[start, end)`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Sessions completed on `start` are included; sessions completed on `end` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CohortWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::ValidationFailed {
                field: "run.cohort_start".to_string(),
                message: format!("cohort window is empty: {start} >= {end}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two ISO-8601 dates (`YYYY-MM-DD`).
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        let start = parse_date("run.cohort_start", start)?;
        let end = parse_date("run.cohort_end", end)?;
        Self::new(start, end)
    }

    /// Start as stored in result keys.
    pub fn start_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End as stored in result keys.
    pub fn end_key(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for CohortWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_key(), self.end_key())
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{value}' is not an ISO date: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_day_window_accepted() {
        let w = CohortWindow::parse("2025-09-01", "2025-09-02").unwrap();
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());
    }

    #[test]
    fn test_empty_window_rejected() {
        assert!(CohortWindow::parse("2025-10-02", "2025-10-02").is_err());
        assert!(CohortWindow::parse("2025-10-03", "2025-10-02").is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let err = CohortWindow::parse("2025-13-01", "2025-10-02").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_keys_roundtrip_format() {
        let w = CohortWindow::parse("2025-09-01", "2025-10-02").unwrap();
        assert_eq!(w.start_key(), "2025-09-01");
        assert_eq!(w.end_key(), "2025-10-02");
        assert_eq!(w.to_string(), "[2025-09-01, 2025-10-02)");
    }
}
