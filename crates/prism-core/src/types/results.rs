//! Persisted result rows. Every row carries its `results_version`.

use serde::{Deserialize, Serialize};

use super::cohort::CohortWindow;
use super::identifiers::{QuestionId, ResultsVersion, ScaleCode, SessionId, UserId};

/// Internal-consistency statistics for one scale in one cohort window.
/// `None` means the statistic could not be computed; it is never stored as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityResult {
    pub scale_code: ScaleCode,
    pub results_version: ResultsVersion,
    pub cohort: CohortWindow,
    pub n_respondents: usize,
    pub alpha: Option<f64>,
    pub omega: Option<f64>,
    pub sem: Option<f64>,
    pub split_half_sb: Option<f64>,
    pub split_half_n: usize,
    pub notes: Option<String>,
}

/// Standardized single-factor loading for one item. `theta = 1 - lambda_std²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingResult {
    pub results_version: ResultsVersion,
    pub scale_code: ScaleCode,
    pub question_id: QuestionId,
    pub lambda_std: f64,
    pub theta: f64,
}

/// Global fit of the single-factor model for one scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfaFitResult {
    pub results_version: ResultsVersion,
    pub scale_code: ScaleCode,
    pub n: usize,
    pub chi_square: f64,
    pub df: usize,
    pub p_value: Option<f64>,
    pub cfi: Option<f64>,
    pub tli: Option<f64>,
    pub rmsea: Option<f64>,
    pub srmr: f64,
}

/// Corrected item-total correlation for one item, computed alongside the
/// reliability row for the same cohort window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStatResult {
    pub results_version: ResultsVersion,
    pub scale_code: ScaleCode,
    pub cohort: CohortWindow,
    pub question_id: QuestionId,
    pub r_it: Option<f64>,
    pub n_used: usize,
}

/// Test-retest correlation for one respondent session pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetestPairResult {
    pub user_id: UserId,
    pub scale_code: ScaleCode,
    pub first_session_id: SessionId,
    pub second_session_id: SessionId,
    pub days_between: i64,
    pub r_pearson: f64,
    pub p_value: Option<f64>,
    pub n_items_correlated: usize,
    pub results_version: ResultsVersion,
}

/// The stored rows a scale write replaces wholesale.
///
/// With `reliability` set, every reliability and item-statistic row for
/// (`results_version`, window) is deleted; with `loadings` set, every loading
/// and fit row for `results_version`. Scales absent from the new batch lose
/// their old rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleResultScope {
    pub results_version: ResultsVersion,
    pub reliability: Option<CohortWindow>,
    pub loadings: bool,
}

impl ScaleResultScope {
    pub fn new(results_version: ResultsVersion) -> Self {
        Self {
            results_version,
            reliability: None,
            loadings: false,
        }
    }

    pub fn with_reliability(mut self, window: CohortWindow) -> Self {
        self.reliability = Some(window);
        self
    }

    pub fn with_loadings(mut self) -> Self {
        self.loadings = true;
        self
    }

    /// Whether a reliability or item-statistic row with this key belongs here.
    pub fn covers_reliability(&self, version: &ResultsVersion, cohort: &CohortWindow) -> bool {
        self.reliability.as_ref() == Some(cohort) && *version == self.results_version
    }

    /// Whether a loading or fit row with this version belongs here.
    pub fn covers_loadings(&self, version: &ResultsVersion) -> bool {
        self.loadings && *version == self.results_version
    }
}

/// Everything the scale jobs write in one transaction, and the scope it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleResultBatch {
    pub scope: ScaleResultScope,
    pub reliability: Vec<ReliabilityResult>,
    pub loadings: Vec<LoadingResult>,
    pub fits: Vec<CfaFitResult>,
    pub item_stats: Vec<ItemStatResult>,
}

impl ScaleResultBatch {
    pub fn new(scope: ScaleResultScope) -> Self {
        Self {
            scope,
            reliability: Vec::new(),
            loadings: Vec::new(),
            fits: Vec::new(),
            item_stats: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn row_count(&self) -> usize {
        self.reliability.len() + self.loadings.len() + self.fits.len() + self.item_stats.len()
    }
}
