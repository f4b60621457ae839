//! Source records read from the external store.

use serde::{Deserialize, Serialize};

use super::identifiers::{QuestionId, ResultsVersion, ScaleCode, SessionId, UserId};

/// One respondent-item answer. `value` is `None` when the item was shown
/// but not answered numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub value: Option<f64>,
}

impl ResponseRecord {
    pub fn new(
        session_id: impl Into<SessionId>,
        question_id: i64,
        value: Option<f64>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            question_id: QuestionId(question_id),
            value,
        }
    }
}

/// An item's membership in a scale. A negative weight marks a reverse-keyed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleItem {
    pub question_id: QuestionId,
    pub weight: f64,
}

impl ScaleItem {
    pub fn new(question_id: i64, weight: f64) -> Self {
        Self {
            question_id: QuestionId(question_id),
            weight,
        }
    }

    pub fn is_reverse_keyed(&self) -> bool {
        self.weight < 0.0
    }
}

/// A named set of items measuring one construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDefinition {
    pub scale_code: ScaleCode,
    pub items: Vec<ScaleItem>,
}

impl ScaleDefinition {
    /// Build a definition with every item positively keyed.
    pub fn new(scale_code: impl Into<ScaleCode>, question_ids: &[i64]) -> Self {
        Self {
            scale_code: scale_code.into(),
            items: question_ids.iter().map(|&q| ScaleItem::new(q, 1.0)).collect(),
        }
    }

    /// Item identifiers in ascending order, deduplicated.
    pub fn item_ids(&self) -> Vec<QuestionId> {
        let mut ids: Vec<QuestionId> = self.items.iter().map(|i| i.question_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn item_count(&self) -> usize {
        self.item_ids().len()
    }

    /// Item identifiers whose weight is negative.
    pub fn reverse_keyed_ids(&self) -> Vec<QuestionId> {
        let mut ids: Vec<QuestionId> = self
            .items
            .iter()
            .filter(|i| i.is_reverse_keyed())
            .map(|i| i.question_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Two completed sessions by the same respondent, separated in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetestCandidate {
    pub user_id: UserId,
    pub first_session_id: SessionId,
    pub second_session_id: SessionId,
    pub results_version: ResultsVersion,
    pub days_between: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ids_sorted_and_deduplicated() {
        let scale = ScaleDefinition::new("EXT", &[30, 10, 20, 10]);
        assert_eq!(
            scale.item_ids(),
            vec![QuestionId(10), QuestionId(20), QuestionId(30)]
        );
        assert_eq!(scale.item_count(), 3);
    }

    #[test]
    fn test_reverse_keyed_ids() {
        let scale = ScaleDefinition {
            scale_code: ScaleCode::from("NEU"),
            items: vec![
                ScaleItem::new(3, -1.0),
                ScaleItem::new(1, 1.0),
                ScaleItem::new(2, -0.5),
            ],
        };
        assert_eq!(scale.reverse_keyed_ids(), vec![QuestionId(2), QuestionId(3)]);
    }
}
