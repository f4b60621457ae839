//! Reliability estimation for one assembled scale matrix.
//!
//! Each statistic is computed independently: a numerical failure in one
//! leaves that field undefined and is recorded, never aborting the others.

pub mod alpha;
pub mod item_total;
pub mod omega;
pub mod sem;
pub mod split_half;

pub use alpha::cronbach_alpha;
pub use item_total::{corrected_item_total, ItemTotal};
pub use omega::omega_proxy;
pub use sem::standard_error_of_measurement;
pub use split_half::{spearman_brown, split_half, SplitHalf};

use prism_core::config::SplitHalfSettings;
use prism_core::constants::PERSISTED_DECIMALS;
use prism_core::types::{
    CohortWindow, ItemStatResult, QuestionId, ReliabilityResult, ResultsVersion, ScaleCode,
};

use crate::descriptive::round_to;
use crate::matrix::ResponseMatrix;

/// Raw, unrounded reliability statistics for one matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilityEstimate {
    pub n_respondents: usize,
    pub n_items: usize,
    pub alpha: Option<f64>,
    pub omega: Option<f64>,
    pub sem: Option<f64>,
    pub split_half: SplitHalf,
    pub item_total: Vec<(QuestionId, ItemTotal)>,
    /// Why a statistic is undefined, one entry per failed statistic.
    pub failures: Vec<String>,
}

impl ReliabilityEstimate {
    /// The persisted reliability row, statistics rounded to 4 decimals.
    pub fn to_result(
        &self,
        scale_code: &ScaleCode,
        results_version: &ResultsVersion,
        cohort: CohortWindow,
    ) -> ReliabilityResult {
        let round = |v: Option<f64>| v.map(|x| round_to(x, PERSISTED_DECIMALS));
        ReliabilityResult {
            scale_code: scale_code.clone(),
            results_version: results_version.clone(),
            cohort,
            n_respondents: self.n_respondents,
            alpha: round(self.alpha),
            omega: round(self.omega),
            sem: round(self.sem),
            split_half_sb: round(self.split_half.rho),
            split_half_n: self.split_half.n,
            notes: (!self.failures.is_empty()).then(|| self.failures.join("; ")),
        }
    }

    /// The persisted item-statistic rows, keyed like the reliability row.
    pub fn to_item_stats(
        &self,
        scale_code: &ScaleCode,
        results_version: &ResultsVersion,
        cohort: CohortWindow,
    ) -> Vec<ItemStatResult> {
        self.item_total
            .iter()
            .map(|(question_id, it)| ItemStatResult {
                results_version: results_version.clone(),
                scale_code: scale_code.clone(),
                cohort,
                question_id: *question_id,
                r_it: it.r_it.map(|r| round_to(r, PERSISTED_DECIMALS)),
                n_used: it.n_used,
            })
            .collect()
    }
}

/// Computes α, the ω proxy, SEM, split-half and item-total statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReliabilityEstimator {
    split_half: SplitHalfSettings,
}

impl ReliabilityEstimator {
    pub fn new(split_half: SplitHalfSettings) -> Self {
        Self { split_half }
    }

    pub fn estimate(&self, matrix: &ResponseMatrix) -> ReliabilityEstimate {
        let values = matrix.values();
        let mut failures = Vec::new();

        let alpha = cronbach_alpha(values);
        if alpha.is_none() {
            failures.push("alpha undefined: non-positive total variance or k <= 1".to_string());
        }

        let omega = match omega_proxy(values) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::debug!(error = %e, "omega proxy failed");
                failures.push(format!("omega undefined: {e}"));
                None
            }
        };

        let sem = standard_error_of_measurement(values, alpha);
        if sem.is_none() {
            failures.push("sem undefined: fewer than 2 respondents".to_string());
        }

        let split_half = split_half(values, &self.split_half);
        let item_total = matrix
            .item_ids()
            .iter()
            .copied()
            .zip(corrected_item_total(values))
            .collect();

        ReliabilityEstimate {
            n_respondents: matrix.n_respondents(),
            n_items: matrix.n_items(),
            alpha,
            omega,
            sem,
            split_half,
            item_total,
            failures,
        }
    }
}
