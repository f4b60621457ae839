//! Single-factor confirmatory loadings.
//!
//! [`FactorFitter::fit`] estimates one latent factor by maximum likelihood on
//! the item correlation matrix and reports standardized loadings, θ = 1 − λ²,
//! and global fit indices. Any numerical failure fails the whole scale.

pub mod fit_indices;
pub mod ml_factor;

pub use fit_indices::{fit_indices, model_df, srmr, FitIndices};
pub use ml_factor::{correlation_matrix, discrepancy, fit_em, implied, ln_det, MlSolution};

use prism_core::constants::{DEFAULT_MIN_ITEMS_FOR_CFA, DEFAULT_MIN_SAMPLE_SIZE};
use prism_core::errors::EstimationError;
use prism_core::types::{CfaFitResult, LoadingResult, QuestionId, ResultsVersion, ScaleCode};

use crate::matrix::ResponseMatrix;

pub const DEFAULT_MAX_ITERATIONS: usize = 20_000;
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Standardized loading and uniqueness of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemLoading {
    pub question_id: QuestionId,
    pub lambda_std: f64,
    pub theta: f64,
}

/// Converged single-factor solution for one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSolution {
    pub n: usize,
    pub loadings: Vec<ItemLoading>,
    pub fit: FitIndices,
    pub iterations: usize,
}

impl FactorSolution {
    pub fn loading(&self, question_id: QuestionId) -> Option<&ItemLoading> {
        self.loadings.iter().find(|l| l.question_id == question_id)
    }

    pub fn to_loading_rows(
        &self,
        scale_code: &ScaleCode,
        results_version: &ResultsVersion,
    ) -> Vec<LoadingResult> {
        self.loadings
            .iter()
            .map(|l| LoadingResult {
                results_version: results_version.clone(),
                scale_code: scale_code.clone(),
                question_id: l.question_id,
                lambda_std: l.lambda_std,
                theta: l.theta,
            })
            .collect()
    }

    pub fn to_fit_row(
        &self,
        scale_code: &ScaleCode,
        results_version: &ResultsVersion,
    ) -> CfaFitResult {
        CfaFitResult {
            results_version: results_version.clone(),
            scale_code: scale_code.clone(),
            n: self.n,
            chi_square: self.fit.chi_square,
            df: self.fit.df,
            p_value: self.fit.p_value,
            cfi: self.fit.cfi,
            tli: self.fit.tli,
            rmsea: self.fit.rmsea,
            srmr: self.fit.srmr,
        }
    }
}

/// One-factor ML fitter with sample guards.
#[derive(Debug, Clone, Copy)]
pub struct FactorFitter {
    pub min_sample_size: usize,
    pub min_items: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for FactorFitter {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            min_items: DEFAULT_MIN_ITEMS_FOR_CFA,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl FactorFitter {
    pub fn new(min_sample_size: usize, min_items: usize) -> Self {
        Self {
            min_sample_size,
            min_items: min_items.max(DEFAULT_MIN_ITEMS_FOR_CFA),
            ..Self::default()
        }
    }

    pub fn fit(&self, matrix: &ResponseMatrix) -> Result<FactorSolution, EstimationError> {
        let n = matrix.n_respondents();
        let p = matrix.n_items();
        if p < self.min_items {
            return Err(EstimationError::TooFewItems {
                found: p,
                minimum: self.min_items,
            });
        }
        if n < self.min_sample_size {
            return Err(EstimationError::TooFewRespondents {
                found: n,
                minimum: self.min_sample_size,
            });
        }
        if matrix.has_missing() {
            return Err(EstimationError::Degenerate {
                reason: "factor fit requires a complete-case matrix".to_string(),
            });
        }

        let r = correlation_matrix(matrix.values(), matrix.item_ids())?;
        let ln_det_r = ln_det(&r).ok_or(EstimationError::RankDeficient)?;
        let solution = fit_em(&r, self.max_iterations, self.tolerance)?;

        let sigma = implied(&solution.lambda, &solution.psi);
        let f_ml = discrepancy(&r, &sigma)?;
        let fit = fit_indices(n, f_ml, ln_det_r, &r, &sigma);

        // A single factor is identified only up to sign.
        let sign = if solution.lambda.sum() < 0.0 { -1.0 } else { 1.0 };
        let loadings = matrix
            .item_ids()
            .iter()
            .zip(solution.lambda.iter().zip(solution.psi.iter()))
            .map(|(&question_id, (&l, &psi))| {
                let lambda_std = (sign * l / (l * l + psi).sqrt()).clamp(-1.0, 1.0);
                ItemLoading {
                    question_id,
                    lambda_std,
                    theta: 1.0 - lambda_std * lambda_std,
                }
            })
            .collect();

        tracing::debug!(
            n,
            p,
            iterations = solution.iterations,
            chi_square = fit.chi_square,
            "single-factor fit converged"
        );

        Ok(FactorSolution {
            n,
            loadings,
            fit,
            iterations: solution.iterations,
        })
    }
}
