//! Per-unit isolation and fatal-error propagation with an in-memory store.

use std::cell::RefCell;

use prism_core::config::{RunSettings, Thresholds};
use prism_core::errors::{JobError, StorageError};
use prism_core::traits::{PsychometricsStore, ResponseFilter, RetestWritePolicy, WriteSummary};
use prism_core::types::{
    QuestionId, ResponseRecord, ResultsVersion, RetestCandidate, RetestPairResult,
    ScaleDefinition, ScaleResultBatch, SessionId,
};
use prism_jobs::{JobKind, Orchestrator, Outcome};

/// Holds source data in vectors; ignores cohort filtering.
#[derive(Default)]
struct MemoryStore {
    scales: Vec<ScaleDefinition>,
    responses: Vec<ResponseRecord>,
    fail_writes: bool,
    written: RefCell<Vec<ScaleResultBatch>>,
}

impl PsychometricsStore for MemoryStore {
    fn scale_definitions(&self, min_items: usize) -> Result<Vec<ScaleDefinition>, StorageError> {
        Ok(self
            .scales
            .iter()
            .filter(|s| s.item_count() >= min_items)
            .cloned()
            .collect())
    }

    fn responses(
        &self,
        item_ids: &[QuestionId],
        _filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        Ok(self
            .responses
            .iter()
            .filter(|r| item_ids.contains(&r.question_id))
            .cloned()
            .collect())
    }

    fn session_responses(
        &self,
        _session_ids: &[SessionId],
        _item_ids: &[QuestionId],
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        Ok(Vec::new())
    }

    fn retest_candidates(
        &self,
        _version: &ResultsVersion,
    ) -> Result<Vec<RetestCandidate>, StorageError> {
        Ok(Vec::new())
    }

    fn write_scale_results(&self, batch: &ScaleResultBatch) -> Result<WriteSummary, StorageError> {
        if self.fail_writes {
            return Err(StorageError::SqliteError {
                message: "disk I/O error".to_string(),
            });
        }
        self.written.borrow_mut().push(batch.clone());
        Ok(WriteSummary {
            inserted: batch.row_count(),
            ..WriteSummary::default()
        })
    }

    fn write_retest_pairs(
        &self,
        rows: &[RetestPairResult],
        _policy: RetestWritePolicy,
    ) -> Result<WriteSummary, StorageError> {
        Ok(WriteSummary {
            inserted: rows.len(),
            ..WriteSummary::default()
        })
    }
}

/// GOOD (items 1-3) is a clean one-factor scale; FLAT (items 4-6) has a
/// constant item 6, which the factor fit rejects.
fn store() -> MemoryStore {
    let mut responses = Vec::new();
    for s in 0..80u32 {
        let truth = f64::from(s % 9);
        let wobble = f64::from((s * 7) % 5) / 10.0;
        let session = format!("s{s:03}");
        for (q, v) in [
            (1, truth),
            (2, truth + wobble),
            (3, truth - wobble),
            (4, truth + wobble),
            (5, truth),
            (6, 3.0),
        ] {
            responses.push(ResponseRecord::new(session.as_str(), q, Some(v)));
        }
    }
    MemoryStore {
        scales: vec![
            ScaleDefinition::new("GOOD", &[1, 2, 3]),
            ScaleDefinition::new("FLAT", &[4, 5, 6]),
        ],
        responses,
        ..MemoryStore::default()
    }
}

#[test]
fn test_estimation_error_is_counted_not_fatal() {
    let store = store();
    let summary = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Loadings)
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.exit_code(), 1);
    let flat = summary.units.iter().find(|u| u.unit == "loadings/FLAT").unwrap();
    assert_eq!(flat.outcome, Outcome::Errored);
    assert!(flat.detail.as_deref().unwrap().starts_with("[FIT_ERROR]"));

    // The surviving scale is still persisted.
    let written = store.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].loadings.len(), 3);
    assert_eq!(written[0].fits.len(), 1);
}

#[test]
fn test_all_skipped_run_still_clears_its_scope() {
    let store = store();
    let settings = RunSettings::new("v1").with_thresholds(Thresholds {
        min_sample_size: 500,
        ..Thresholds::default()
    });
    let summary = Orchestrator::new(&store, settings)
        .run(JobKind::Loadings)
        .unwrap();
    assert_eq!(summary.skipped, 2);

    let written = store.written.borrow();
    assert_eq!(written.len(), 1);
    assert!(written[0].is_empty());
    assert!(written[0].scope.loadings);
    assert_eq!(written[0].scope.reliability, None);
    assert_eq!(written[0].scope.results_version, ResultsVersion::from("v1"));
}

#[test]
fn test_storage_failure_is_fatal() {
    let store = MemoryStore {
        fail_writes: true,
        ..store()
    };
    let err = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Loadings)
        .unwrap_err();
    assert!(matches!(err, JobError::Storage(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_retest_without_candidates_writes_nothing() {
    let store = store();
    let summary = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Retest)
        .unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(summary.rows_written, 0);
    assert_eq!(summary.exit_code(), 0);
}
