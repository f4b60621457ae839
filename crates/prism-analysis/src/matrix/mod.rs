//! Analysis matrices: respondents (rows) x items (columns) for one scale.

pub mod assembler;
pub mod scale_sums;

pub use assembler::{assemble, AssemblyRules};
pub use scale_sums::ScaleSums;

use nalgebra::DMatrix;
use prism_core::config::ReverseKeying;
use prism_core::errors::EstimationError;
use prism_core::types::{QuestionId, SessionId};

/// A rectangular response matrix with stable row and column labels.
///
/// Matrices built by [`assemble`] are complete-case: every cell is finite.
/// Matrices built with [`ResponseMatrix::from_dmatrix`] may carry `NaN` for
/// missing cells; estimators that accept them say so explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMatrix {
    session_ids: Vec<SessionId>,
    item_ids: Vec<QuestionId>,
    values: DMatrix<f64>,
}

impl ResponseMatrix {
    pub(crate) fn new(
        session_ids: Vec<SessionId>,
        item_ids: Vec<QuestionId>,
        values: DMatrix<f64>,
    ) -> Self {
        debug_assert_eq!(session_ids.len(), values.nrows());
        debug_assert_eq!(item_ids.len(), values.ncols());
        Self {
            session_ids,
            item_ids,
            values,
        }
    }

    /// Wrap raw values with synthetic labels: sessions `s0, s1, ...` and
    /// question ids `1..=ncols`.
    pub fn from_dmatrix(values: DMatrix<f64>) -> Self {
        let session_ids = (0..values.nrows())
            .map(|i| SessionId::new(format!("s{i}")))
            .collect();
        let item_ids = (1..=values.ncols() as i64).map(QuestionId).collect();
        Self::new(session_ids, item_ids, values)
    }

    /// Build from row-major values with synthetic labels.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_dmatrix(DMatrix::from_row_slice(nrows, ncols, &flat))
    }

    pub fn n_respondents(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.values.ncols()
    }

    pub fn session_ids(&self) -> &[SessionId] {
        &self.session_ids
    }

    pub fn item_ids(&self) -> &[QuestionId] {
        &self.item_ids
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Values of column `j`, top to bottom.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.values.column(j).iter().copied().collect()
    }

    /// Sum across items for each respondent.
    pub fn row_sums(&self) -> Vec<f64> {
        row_sums(&self.values)
    }

    /// Whether any cell is missing (non-finite).
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Reverse-code the listed items in place: `v -> (min + max) - v`.
    /// No-op when keying is disabled.
    pub fn reverse_keyed(mut self, items: &[QuestionId], keying: &ReverseKeying) -> Self {
        if !keying.enabled || items.is_empty() {
            return self;
        }
        let pivot = keying.response_min + keying.response_max;
        for (j, id) in self.item_ids.iter().enumerate() {
            if items.contains(id) {
                for v in self.values.column_mut(j).iter_mut() {
                    *v = pivot - *v;
                }
            }
        }
        self
    }
}

/// How an estimator treats missing cells.
///
/// The assembler's listwise deletion makes `CompleteCase` the default
/// everywhere. `ColumnMeanImputation` is used by exactly one estimator: the
/// SVD-based omega proxy (see [`crate::reliability::omega`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValuePolicy {
    /// Rows with any missing cell are dropped.
    CompleteCase,
    /// Missing cells are replaced with their column mean.
    ColumnMeanImputation,
}

impl MissingValuePolicy {
    /// Apply the policy, returning a matrix without missing cells.
    ///
    /// Fails when no row survives (`CompleteCase`) or a column has no
    /// observed value to average (`ColumnMeanImputation`).
    pub fn apply(self, values: &DMatrix<f64>) -> Result<DMatrix<f64>, EstimationError> {
        match self {
            Self::CompleteCase => {
                let keep: Vec<usize> = (0..values.nrows())
                    .filter(|&i| values.row(i).iter().all(|v| v.is_finite()))
                    .collect();
                if keep.is_empty() {
                    return Err(EstimationError::TooFewRespondents {
                        found: 0,
                        minimum: 1,
                    });
                }
                Ok(values.select_rows(keep.iter()))
            }
            Self::ColumnMeanImputation => {
                let mut out = values.clone();
                for j in 0..out.ncols() {
                    let observed: Vec<f64> =
                        out.column(j).iter().copied().filter(|v| v.is_finite()).collect();
                    if observed.is_empty() {
                        return Err(EstimationError::Degenerate {
                            reason: format!("column {j} has no observed values"),
                        });
                    }
                    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
                    for v in out.column_mut(j).iter_mut() {
                        if !v.is_finite() {
                            *v = mean;
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Per-row sums of a matrix.
pub(crate) fn row_sums(values: &DMatrix<f64>) -> Vec<f64> {
    (0..values.nrows()).map(|i| values.row(i).sum()).collect()
}
