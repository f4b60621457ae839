//! Numerical estimation errors (the per-scale "fit error").

use super::error_code::{self, PrismErrorCode};

/// Errors raised by an estimator on degenerate or non-convergent input.
/// Never escalates past the scale or pair being processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("Did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("Matrix is rank deficient")]
    RankDeficient,

    #[error("Item {item} has zero variance")]
    ZeroVariance { item: String },

    #[error("Too few items: {found} < {minimum}")]
    TooFewItems { found: usize, minimum: usize },

    #[error("Too few respondents: {found} < {minimum}")]
    TooFewRespondents { found: usize, minimum: usize },

    #[error("Degenerate input: {reason}")]
    Degenerate { reason: String },
}

impl PrismErrorCode for EstimationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NonConvergence { .. } => error_code::NON_CONVERGENCE,
            _ => error_code::FIT_ERROR,
        }
    }
}
