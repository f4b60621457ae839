//! Long-format responses -> complete-case analysis matrix.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::DMatrix;
use prism_core::config::Thresholds;
use prism_core::types::{QuestionId, ResponseRecord, SessionId};

use super::ResponseMatrix;
use crate::rejection::RejectionReason;

/// Size rules checked before any statistic is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyRules {
    pub min_items: usize,
    pub min_sample_size: usize,
}

impl AssemblyRules {
    /// Rules for the reliability estimators.
    pub fn for_reliability(thresholds: &Thresholds) -> Self {
        Self {
            min_items: thresholds.min_items,
            min_sample_size: thresholds.min_sample_size,
        }
    }

    /// Rules for the single-factor fit.
    pub fn for_loadings(thresholds: &Thresholds) -> Self {
        Self {
            min_items: thresholds.min_items_for_cfa,
            min_sample_size: thresholds.min_sample_size,
        }
    }
}

/// Assemble the complete-case matrix for one scale.
///
/// Columns are the distinct `item_ids` in ascending order. A session becomes
/// a row only if it has a non-missing, finite value for every column; rows
/// are ordered by session id. Records for other items are ignored, and when
/// a session answers the same item twice the first numeric answer wins.
///
/// Returns a [`RejectionReason`] (not an error) when the scale has fewer than
/// `min_items` items or fewer than `min_sample_size` sessions survive.
pub fn assemble(
    responses: &[ResponseRecord],
    item_ids: &[QuestionId],
    rules: &AssemblyRules,
) -> Result<ResponseMatrix, RejectionReason> {
    let columns: Vec<QuestionId> = item_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if columns.len() < rules.min_items {
        return Err(RejectionReason::TooFewItems {
            found: columns.len(),
            minimum: rules.min_items,
        });
    }

    let wanted: BTreeSet<QuestionId> = columns.iter().copied().collect();
    let mut by_session: BTreeMap<&SessionId, BTreeMap<QuestionId, f64>> = BTreeMap::new();
    for record in responses {
        if !wanted.contains(&record.question_id) {
            continue;
        }
        let Some(value) = record.value.filter(|v| v.is_finite()) else {
            continue;
        };
        by_session
            .entry(&record.session_id)
            .or_default()
            .entry(record.question_id)
            .or_insert(value);
    }

    let mut session_ids = Vec::new();
    let mut flat = Vec::new();
    for (session_id, answers) in &by_session {
        if answers.len() != columns.len() {
            continue;
        }
        session_ids.push((*session_id).clone());
        flat.extend(columns.iter().map(|q| answers[q]));
    }

    if session_ids.len() < rules.min_sample_size {
        return Err(RejectionReason::TooFewRespondents {
            found: session_ids.len(),
            minimum: rules.min_sample_size,
        });
    }

    let values = DMatrix::from_row_slice(session_ids.len(), columns.len(), &flat);
    Ok(ResponseMatrix::new(session_ids, columns, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(min_items: usize, min_sample_size: usize) -> AssemblyRules {
        AssemblyRules {
            min_items,
            min_sample_size,
        }
    }

    fn ids(raw: &[i64]) -> Vec<QuestionId> {
        raw.iter().copied().map(QuestionId).collect()
    }

    #[test]
    fn test_listwise_deletion() {
        let responses = vec![
            ResponseRecord::new("a", 1, Some(1.0)),
            ResponseRecord::new("a", 2, Some(2.0)),
            ResponseRecord::new("b", 1, Some(3.0)),
            ResponseRecord::new("b", 2, None),
            ResponseRecord::new("c", 2, Some(4.0)),
            ResponseRecord::new("c", 1, Some(5.0)),
        ];
        let m = assemble(&responses, &ids(&[1, 2]), &rules(2, 1)).unwrap();
        assert_eq!(m.n_respondents(), 2);
        assert_eq!(m.session_ids(), &[SessionId::from("a"), SessionId::from("c")]);
        assert_eq!(m.column(0), vec![1.0, 5.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0]);
    }

    #[test]
    fn test_columns_sorted_ascending() {
        let responses = vec![
            ResponseRecord::new("a", 9, Some(9.0)),
            ResponseRecord::new("a", 3, Some(3.0)),
        ];
        let m = assemble(&responses, &ids(&[9, 3, 9]), &rules(2, 1)).unwrap();
        assert_eq!(m.item_ids(), &ids(&[3, 9])[..]);
        assert_eq!(m.column(0), vec![3.0]);
    }

    #[test]
    fn test_ignores_unrequested_items() {
        let responses = vec![
            ResponseRecord::new("a", 1, Some(1.0)),
            ResponseRecord::new("a", 2, Some(2.0)),
            ResponseRecord::new("a", 99, Some(7.0)),
        ];
        let m = assemble(&responses, &ids(&[1, 2]), &rules(2, 1)).unwrap();
        assert_eq!(m.n_items(), 2);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let responses = vec![
            ResponseRecord::new("a", 1, Some(1.0)),
            ResponseRecord::new("a", 1, Some(4.0)),
            ResponseRecord::new("a", 2, Some(2.0)),
        ];
        let m = assemble(&responses, &ids(&[1, 2]), &rules(2, 1)).unwrap();
        assert_eq!(m.column(0), vec![1.0]);
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let responses = vec![
            ResponseRecord::new("a", 1, Some(f64::NAN)),
            ResponseRecord::new("a", 2, Some(2.0)),
        ];
        let err = assemble(&responses, &ids(&[1, 2]), &rules(2, 1)).unwrap_err();
        assert_eq!(
            err,
            RejectionReason::TooFewRespondents {
                found: 0,
                minimum: 1
            }
        );
    }

    #[test]
    fn test_rejects_too_few_items() {
        let err = assemble(&[], &ids(&[1]), &rules(2, 1)).unwrap_err();
        assert_eq!(err, RejectionReason::TooFewItems { found: 1, minimum: 2 });
    }

    #[test]
    fn test_rejects_small_sample() {
        let responses: Vec<ResponseRecord> = (0..49)
            .flat_map(|s| {
                (1..=5).map(move |q| ResponseRecord::new(format!("s{s:03}").as_str(), q, Some(3.0)))
            })
            .collect();
        let err = assemble(&responses, &ids(&[1, 2, 3, 4, 5]), &rules(2, 50)).unwrap_err();
        assert_eq!(
            err,
            RejectionReason::TooFewRespondents {
                found: 49,
                minimum: 50
            }
        );
    }
}
