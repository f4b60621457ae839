//! Run identity configuration: results version and cohort window.

use serde::{Deserialize, Serialize};

use crate::traits::RetestWritePolicy;

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Tag written on every result row. Required.
    pub results_version: Option<String>,
    /// Inclusive cohort start date, `YYYY-MM-DD`.
    pub cohort_start: Option<String>,
    /// Exclusive cohort end date, `YYYY-MM-DD`.
    pub cohort_end: Option<String>,
    /// Retest re-run policy. Default: insert_if_absent.
    pub retest_write_policy: Option<RetestWritePolicy>,
}

impl RunConfig {
    pub fn effective_retest_write_policy(&self) -> RetestWritePolicy {
        self.retest_write_policy.unwrap_or_default()
    }
}
