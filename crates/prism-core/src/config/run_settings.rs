//! Validated, explicit run configuration handed to the orchestrator.

use serde::Serialize;

use crate::constants;
use crate::errors::ConfigError;
use crate::traits::RetestWritePolicy;
use crate::types::{CohortWindow, ResultsVersion};

/// Sample and item thresholds applied before any statistic is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub min_sample_size: usize,
    pub min_items: usize,
    pub min_items_for_cfa: usize,
    pub min_common_scales: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_sample_size: constants::DEFAULT_MIN_SAMPLE_SIZE,
            min_items: constants::DEFAULT_MIN_ITEMS,
            min_items_for_cfa: constants::DEFAULT_MIN_ITEMS_FOR_CFA,
            min_common_scales: constants::DEFAULT_MIN_COMMON_SCALES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitHalfSettings {
    pub iterations: usize,
    pub seed: u64,
}

impl Default for SplitHalfSettings {
    fn default() -> Self {
        Self {
            iterations: constants::DEFAULT_SPLIT_HALF_ITERATIONS,
            seed: constants::DEFAULT_SPLIT_HALF_SEED,
        }
    }
}

/// Reverse-coding of negatively weighted items: `value -> (min + max) - value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReverseKeying {
    pub enabled: bool,
    pub response_min: f64,
    pub response_max: f64,
}

impl Default for ReverseKeying {
    fn default() -> Self {
        Self {
            enabled: false,
            response_min: constants::DEFAULT_RESPONSE_MIN,
            response_max: constants::DEFAULT_RESPONSE_MAX,
        }
    }
}

/// Everything a run needs to know, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSettings {
    pub results_version: ResultsVersion,
    pub cohort: Option<CohortWindow>,
    pub thresholds: Thresholds,
    pub split_half: SplitHalfSettings,
    pub reverse_keying: ReverseKeying,
    pub retest_write_policy: RetestWritePolicy,
}

impl RunSettings {
    /// Settings with compiled defaults for everything but the version.
    pub fn new(results_version: impl Into<ResultsVersion>) -> Self {
        Self {
            results_version: results_version.into(),
            cohort: None,
            thresholds: Thresholds::default(),
            split_half: SplitHalfSettings::default(),
            reverse_keying: ReverseKeying::default(),
            retest_write_policy: RetestWritePolicy::default(),
        }
    }

    pub fn with_cohort(mut self, cohort: CohortWindow) -> Self {
        self.cohort = Some(cohort);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// The cohort window, or a `MissingField` error for jobs whose result key needs one.
    pub fn require_cohort(&self) -> Result<CohortWindow, ConfigError> {
        self.cohort.ok_or_else(|| ConfigError::MissingField {
            field: "run.cohort_start/run.cohort_end".to_string(),
        })
    }
}
