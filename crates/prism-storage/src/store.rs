//! [`PsychometricsStore`] on SQLite.

use std::path::Path;
use std::time::Instant;

use prism_core::errors::StorageError;
use prism_core::tracing::fields;
use prism_core::traits::{PsychometricsStore, ResponseFilter, RetestWritePolicy, WriteSummary};
use prism_core::types::{
    QuestionId, ResponseRecord, ResultsVersion, RetestCandidate, RetestPairResult,
    ScaleDefinition, ScaleResultBatch, SessionId,
};
use tracing::field::Empty;

use crate::connection::writer::with_immediate_transaction;
use crate::connection::DatabaseManager;
use crate::queries::{responses, results, retest, scales};

/// SQLite-backed store. Each write call commits one transaction.
pub struct SqliteStore {
    db: DatabaseManager,
}

impl SqliteStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        DatabaseManager::open(path).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        DatabaseManager::open_in_memory().map(Self::new)
    }

    /// The underlying database, for imports and inspection.
    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }
}

impl PsychometricsStore for SqliteStore {
    fn scale_definitions(&self, min_items: usize) -> Result<Vec<ScaleDefinition>, StorageError> {
        self.db
            .with_reader(|conn| scales::load_scale_definitions(conn, min_items))
    }

    fn responses(
        &self,
        item_ids: &[QuestionId],
        filter: &ResponseFilter,
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        self.db
            .with_reader(|conn| responses::load_responses(conn, item_ids, filter))
    }

    fn session_responses(
        &self,
        session_ids: &[SessionId],
        item_ids: &[QuestionId],
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        self.db
            .with_reader(|conn| responses::load_session_responses(conn, session_ids, item_ids))
    }

    fn retest_candidates(
        &self,
        version: &ResultsVersion,
    ) -> Result<Vec<RetestCandidate>, StorageError> {
        self.db
            .with_reader(|conn| retest::load_retest_candidates(conn, version))
    }

    fn write_scale_results(&self, batch: &ScaleResultBatch) -> Result<WriteSummary, StorageError> {
        let span = tracing::info_span!(
            "write_scale_results",
            results_version = %batch.scope.results_version,
            rows_written = Empty,
            rows_deleted = Empty,
            batch_write_time = Empty
        );
        let _entered = span.enter();
        let started = Instant::now();

        let summary = self.db.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| results::replace_scale_results(tx, batch))
        })?;

        span.record(fields::ROWS_WRITTEN, summary.inserted);
        span.record(fields::ROWS_DELETED, summary.deleted);
        span.record(fields::BATCH_WRITE_TIME, started.elapsed().as_millis() as u64);
        tracing::info!(
            inserted = summary.inserted,
            deleted = summary.deleted,
            "scale results committed"
        );
        Ok(summary)
    }

    fn write_retest_pairs(
        &self,
        rows: &[RetestPairResult],
        policy: RetestWritePolicy,
    ) -> Result<WriteSummary, StorageError> {
        let span = tracing::info_span!(
            "write_retest_pairs",
            rows_written = Empty,
            rows_deleted = Empty,
            batch_write_time = Empty
        );
        let _entered = span.enter();
        let started = Instant::now();

        let summary = self.db.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| results::write_retest_pairs(tx, rows, policy))
        })?;

        span.record(fields::ROWS_WRITTEN, summary.inserted);
        span.record(fields::ROWS_DELETED, summary.deleted);
        span.record(fields::BATCH_WRITE_TIME, started.elapsed().as_millis() as u64);
        if summary.ignored > 0 {
            tracing::warn!(
                ignored = summary.ignored,
                ?policy,
                "retest rows already stored for this version were kept; new rows ignored"
            );
        }
        tracing::info!(
            inserted = summary.inserted,
            deleted = summary.deleted,
            "retest pairs committed"
        );
        Ok(summary)
    }
}
