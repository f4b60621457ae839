//! Test-retest correlation for respondent session pairs.
//!
//! Each pair is correlated over the scale sums both sessions share: one point
//! per common scale, so r measures the stability of the respondent's profile
//! across scales. The result carries the aggregate scale code.

pub mod pearson;

pub use pearson::{pearson_with_significance, Correlation};

use prism_core::constants::{AGGREGATE_SCALE_CODE, PERSISTED_DECIMALS};
use prism_core::types::{RetestCandidate, RetestPairResult, ScaleCode};

use crate::descriptive::round_to;
use crate::matrix::ScaleSums;
use crate::rejection::RejectionReason;

/// Correlate one candidate pair, or say why it was skipped.
///
/// `min_common_scales` below 3 is raised to 3: a correlation over fewer
/// paired points is never computed.
pub fn correlate(
    pair: &RetestCandidate,
    sums: &ScaleSums,
    min_common_scales: usize,
) -> Result<RetestPairResult, RejectionReason> {
    let minimum = min_common_scales.max(3);
    let first = sums
        .get(&pair.first_session_id)
        .ok_or_else(|| RejectionReason::NoScaleSums {
            session_id: pair.first_session_id.clone(),
        })?;
    let second = sums
        .get(&pair.second_session_id)
        .ok_or_else(|| RejectionReason::NoScaleSums {
            session_id: pair.second_session_id.clone(),
        })?;

    // BTreeMap iteration gives a stable scale order.
    let (x, y): (Vec<f64>, Vec<f64>) = first
        .iter()
        .filter_map(|(code, a)| second.get(code).map(|b| (*a, *b)))
        .unzip();
    if x.len() < minimum {
        return Err(RejectionReason::TooFewCommonScales {
            found: x.len(),
            minimum,
        });
    }

    let c = pearson_with_significance(&x, &y).map_err(RejectionReason::Undefined)?;
    Ok(RetestPairResult {
        user_id: pair.user_id.clone(),
        scale_code: ScaleCode::from(AGGREGATE_SCALE_CODE),
        first_session_id: pair.first_session_id.clone(),
        second_session_id: pair.second_session_id.clone(),
        days_between: pair.days_between,
        r_pearson: round_to(c.r, PERSISTED_DECIMALS),
        p_value: c.p_value.map(|p| round_to(p, PERSISTED_DECIMALS)),
        n_items_correlated: c.n,
        results_version: pair.results_version.clone(),
    })
}
