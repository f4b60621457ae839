//! Expected, non-error reasons for not computing a statistic.

use std::fmt;

use prism_core::errors::EstimationError;
use prism_core::types::SessionId;

/// Why a scale or retest pair was skipped. A rejection is a normal outcome:
/// it is counted, logged at info level, and never fails the run.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// The scale has fewer items than the estimator needs.
    TooFewItems { found: usize, minimum: usize },
    /// Listwise deletion left fewer complete-case respondents than required.
    TooFewRespondents { found: usize, minimum: usize },
    /// A retest session has no recorded scale sums.
    NoScaleSums { session_id: SessionId },
    /// The two retest sessions share fewer scales than required.
    TooFewCommonScales { found: usize, minimum: usize },
    /// The retest correlation is numerically undefined for this pair.
    Undefined(EstimationError),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewItems { found, minimum } => {
                write!(f, "too few items ({found} < {minimum})")
            }
            Self::TooFewRespondents { found, minimum } => {
                write!(f, "insufficient data (n={found} < {minimum})")
            }
            Self::NoScaleSums { session_id } => {
                write!(f, "session {session_id} has no scale sums")
            }
            Self::TooFewCommonScales { found, minimum } => {
                write!(f, "too few common scales ({found} < {minimum})")
            }
            Self::Undefined(e) => write!(f, "correlation undefined: {e}"),
        }
    }
}
