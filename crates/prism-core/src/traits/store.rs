//! The store contract: three reads and the result writes.
//!
//! The orchestrator depends only on this trait; `prism-storage` provides the
//! SQLite implementation and tests may provide their own.

use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::types::{
    CohortWindow, QuestionId, ResponseRecord, ResultsVersion, RetestCandidate,
    RetestPairResult, ScaleDefinition, ScaleResultBatch, SessionId,
};

/// Restrictions applied when reading response records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseFilter {
    /// Only sessions completed inside this window.
    pub cohort: Option<CohortWindow>,
    /// Only sessions with a non-null answer for every requested item.
    pub complete_coverage: bool,
}

impl ResponseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_cohort(cohort: CohortWindow) -> Self {
        Self {
            cohort: Some(cohort),
            complete_coverage: false,
        }
    }

    pub fn with_complete_coverage(mut self) -> Self {
        self.complete_coverage = true;
        self
    }
}

/// How retest rows already present for a key are treated on re-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetestWritePolicy {
    /// Existing rows for the key are kept; the new row is dropped.
    #[default]
    InsertIfAbsent,
    /// Existing rows for the key are deleted and the new row inserted.
    Replace,
}

/// Row counts from one committed write batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub deleted: usize,
    pub inserted: usize,
    /// Rows not written because the key already existed (insert-if-absent).
    pub ignored: usize,
}

/// External data store as seen by the run orchestrator.
pub trait PsychometricsStore {
    /// Scale definitions with at least `min_items` distinct items, ordered by scale code.
    fn scale_definitions(&self, min_items: usize) -> Result<Vec<ScaleDefinition>, StorageError>;

    /// Response records for `item_ids`, restricted by `filter`.
    fn responses(
        &self,
        item_ids: &[QuestionId],
        filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, StorageError>;

    /// Response records for `item_ids` from the given sessions only.
    fn session_responses(
        &self,
        session_ids: &[SessionId],
        item_ids: &[QuestionId],
    ) -> Result<Vec<ResponseRecord>, StorageError>;

    /// Candidate retest pairs recorded for one results version.
    fn retest_candidates(
        &self,
        version: &ResultsVersion,
    ) -> Result<Vec<RetestCandidate>, StorageError>;

    /// In one transaction, delete every stored row `batch.scope` covers and
    /// insert the batch rows. An empty batch still clears its scope.
    fn write_scale_results(&self, batch: &ScaleResultBatch) -> Result<WriteSummary, StorageError>;

    /// Write retest rows in one transaction under `policy`.
    fn write_retest_pairs(
        &self,
        rows: &[RetestPairResult],
        policy: RetestWritePolicy,
    ) -> Result<WriteSummary, StorageError>;
}
