//! Per-session scale sums, the input to the retest correlator.

use std::collections::{BTreeMap, HashMap, HashSet};

use prism_core::config::ReverseKeying;
use prism_core::types::{QuestionId, ResponseRecord, ScaleCode, ScaleDefinition, SessionId};

/// `session -> scale -> sum of the session's non-missing answers on that scale`.
///
/// A session appears for a scale as soon as it answered one of the scale's
/// items; sums are not restricted to complete cases. When a session answers
/// the same item more than once, only its first finite answer counts, the
/// same rule [`assemble`](super::assemble) applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleSums {
    by_session: BTreeMap<SessionId, BTreeMap<ScaleCode, f64>>,
}

impl ScaleSums {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum responses into every scale each item belongs to.
    ///
    /// With reverse keying enabled, answers to negatively weighted items are
    /// reverse-coded before summing.
    pub fn from_responses(
        responses: &[ResponseRecord],
        scales: &[ScaleDefinition],
        keying: &ReverseKeying,
    ) -> Self {
        let pivot = keying.response_min + keying.response_max;
        let mut membership: HashMap<QuestionId, Vec<(&ScaleCode, bool)>> = HashMap::new();
        for scale in scales {
            for item in &scale.items {
                let entry = membership.entry(item.question_id).or_default();
                if !entry.iter().any(|(code, _)| *code == &scale.scale_code) {
                    entry.push((&scale.scale_code, keying.enabled && item.is_reverse_keyed()));
                }
            }
        }

        let mut sums = Self::new();
        let mut seen: HashSet<(&SessionId, QuestionId)> = HashSet::new();
        for record in responses {
            let Some(value) = record.value.filter(|v| v.is_finite()) else {
                continue;
            };
            let Some(scales) = membership.get(&record.question_id) else {
                continue;
            };
            if !seen.insert((&record.session_id, record.question_id)) {
                continue;
            }
            for (code, reverse) in scales {
                let v = if *reverse { pivot - value } else { value };
                sums.add(record.session_id.clone(), (*code).clone(), v);
            }
        }
        sums
    }

    /// Add `value` to the running sum for `(session, scale)`.
    pub fn add(&mut self, session_id: SessionId, scale_code: ScaleCode, value: f64) {
        *self
            .by_session
            .entry(session_id)
            .or_default()
            .entry(scale_code)
            .or_insert(0.0) += value;
    }

    /// Scale sums for one session, if it has any.
    pub fn get(&self, session_id: &SessionId) -> Option<&BTreeMap<ScaleCode, f64>> {
        self.by_session.get(session_id).filter(|s| !s.is_empty())
    }

    pub fn session_count(&self) -> usize {
        self.by_session.len()
    }
}
