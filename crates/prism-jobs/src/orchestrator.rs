//! Run orchestrator: per-unit isolation, tallying, and batched persistence.
//!
//! Every scale or pair yields exactly one [`UnitOutcome`]. Rejections and
//! estimation errors stay inside their unit; only configuration and storage
//! errors end the run. Reliability, loading, fit and item-statistic rows are
//! committed together after all scales are processed, replacing everything
//! stored for the run's version and window; retest rows commit in their own
//! transaction.

use std::collections::BTreeSet;

use prism_analysis::loadings::FactorFitter;
use prism_analysis::matrix::{assemble, AssemblyRules, ResponseMatrix, ScaleSums};
use prism_analysis::reliability::ReliabilityEstimator;
use prism_analysis::retest::correlate;
use prism_analysis::RejectionReason;
use prism_core::config::RunSettings;
use prism_core::errors::{JobError, PrismErrorCode};
use prism_core::tracing::fields;
use prism_core::traits::{PsychometricsStore, ResponseFilter};
use prism_core::types::{
    CohortWindow, QuestionId, ResponseRecord, RetestCandidate, ScaleDefinition, ScaleResultBatch,
    ScaleResultScope, SessionId,
};
use tracing::field::Empty;

use crate::outcome::{JobKind, RunSummary, UnitOutcome};

/// Runs jobs against a store with settings fixed at construction.
pub struct Orchestrator<'a, S: PsychometricsStore> {
    store: &'a S,
    settings: RunSettings,
}

impl<'a, S: PsychometricsStore> Orchestrator<'a, S> {
    pub fn new(store: &'a S, settings: RunSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run one job. Fails only on configuration or storage errors.
    pub fn run(&self, job: JobKind) -> Result<RunSummary, JobError> {
        // Result keys that include the window need it before any work starts.
        let cohort = if job.includes_reliability() {
            Some(self.settings.require_cohort()?)
        } else {
            self.settings.cohort
        };

        let span = tracing::info_span!(
            "run",
            job = %job,
            results_version = %self.settings.results_version,
            units_processed = Empty
        );
        let _entered = span.enter();

        let mut summary = RunSummary::new(job, self.settings.results_version.clone(), cohort);

        if job.includes_reliability() || job.includes_loadings() {
            self.run_scales(job, cohort, &mut summary)?;
        }
        if job.includes_retest() {
            self.run_retest(&mut summary)?;
        }

        span.record(fields::UNITS_PROCESSED, summary.total());
        tracing::info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            errored = summary.errored,
            rows_written = summary.rows_written,
            "run finished"
        );
        Ok(summary)
    }

    fn run_scales(
        &self,
        job: JobKind,
        cohort: Option<CohortWindow>,
        summary: &mut RunSummary,
    ) -> Result<(), JobError> {
        let thresholds = &self.settings.thresholds;
        let mut min_items = usize::MAX;
        if job.includes_reliability() {
            min_items = min_items.min(thresholds.min_items);
        }
        if job.includes_loadings() {
            min_items = min_items.min(thresholds.min_items_for_cfa);
        }
        let scales = self.store.scale_definitions(min_items)?;
        tracing::info!(scales = scales.len(), "loaded scale definitions");

        let reliability_window = cohort.filter(|_| job.includes_reliability());
        let mut scope = ScaleResultScope::new(self.settings.results_version.clone());
        if let Some(window) = reliability_window {
            scope = scope.with_reliability(window);
        }
        if job.includes_loadings() {
            scope = scope.with_loadings();
        }

        let mut batch = ScaleResultBatch::new(scope);
        for scale in &scales {
            if let Some(window) = reliability_window {
                let unit = self.reliability_unit(scale, window, &mut batch)?;
                summary.record(unit);
            }
            if job.includes_loadings() {
                let unit = self.loadings_unit(scale, &mut batch)?;
                summary.record(unit);
            }
        }

        // Written even when empty: rows from scales skipped this run must go.
        let written = self.store.write_scale_results(&batch)?;
        if written.deleted > 0 {
            tracing::info!(deleted = written.deleted, "replaced stored scale results");
        }
        summary.rows_written += written.inserted;
        Ok(())
    }

    fn reliability_unit(
        &self,
        scale: &ScaleDefinition,
        window: CohortWindow,
        batch: &mut ScaleResultBatch,
    ) -> Result<UnitOutcome, JobError> {
        let unit = format!("reliability/{}", scale.scale_code);
        let item_ids = scale.item_ids();
        let responses = self
            .store
            .responses(&item_ids, &ResponseFilter::in_cohort(window))?;
        let rules = AssemblyRules::for_reliability(&self.settings.thresholds);

        let matrix = match self.prepare(scale, &responses, &item_ids, &rules) {
            Ok(m) => m,
            Err(reason) => return Ok(skip(unit, scale, &reason)),
        };

        let estimate = ReliabilityEstimator::new(self.settings.split_half).estimate(&matrix);
        let version = &self.settings.results_version;
        let row = estimate.to_result(&scale.scale_code, version, window);
        tracing::info!(
            scale_code = %scale.scale_code,
            n_respondents = estimate.n_respondents,
            n_items = estimate.n_items,
            alpha = ?row.alpha,
            omega = ?row.omega,
            "reliability computed"
        );
        let detail = row.notes.clone();
        batch.reliability.push(row);
        batch
            .item_stats
            .extend(estimate.to_item_stats(&scale.scale_code, version, window));
        Ok(UnitOutcome::succeeded(unit, detail))
    }

    fn loadings_unit(
        &self,
        scale: &ScaleDefinition,
        batch: &mut ScaleResultBatch,
    ) -> Result<UnitOutcome, JobError> {
        let unit = format!("loadings/{}", scale.scale_code);
        let thresholds = &self.settings.thresholds;
        let rules = AssemblyRules::for_loadings(thresholds);
        if scale.item_count() < rules.min_items {
            let reason = RejectionReason::TooFewItems {
                found: scale.item_count(),
                minimum: rules.min_items,
            };
            return Ok(skip(unit, scale, &reason));
        }

        let item_ids = scale.item_ids();
        let responses = self
            .store
            .responses(&item_ids, &ResponseFilter::all().with_complete_coverage())?;
        let matrix = match self.prepare(scale, &responses, &item_ids, &rules) {
            Ok(m) => m,
            Err(reason) => return Ok(skip(unit, scale, &reason)),
        };

        let fitter = FactorFitter::new(thresholds.min_sample_size, thresholds.min_items_for_cfa);
        match fitter.fit(&matrix) {
            Ok(solution) => {
                let version = &self.settings.results_version;
                tracing::info!(
                    scale_code = %scale.scale_code,
                    n_respondents = solution.n,
                    n_items = solution.loadings.len(),
                    iterations = solution.iterations,
                    "loadings computed"
                );
                batch
                    .loadings
                    .extend(solution.to_loading_rows(&scale.scale_code, version));
                batch.fits.push(solution.to_fit_row(&scale.scale_code, version));
                Ok(UnitOutcome::succeeded(unit, None))
            }
            Err(e) => {
                tracing::warn!(
                    scale_code = %scale.scale_code,
                    code = e.error_code(),
                    error = %e,
                    "factor fit failed"
                );
                Ok(UnitOutcome::errored(unit, e.summary_string()))
            }
        }
    }

    /// Assemble and reverse-key one scale's matrix.
    fn prepare(
        &self,
        scale: &ScaleDefinition,
        responses: &[ResponseRecord],
        item_ids: &[QuestionId],
        rules: &AssemblyRules,
    ) -> Result<ResponseMatrix, RejectionReason> {
        let matrix = assemble(responses, item_ids, rules)?;
        Ok(matrix.reverse_keyed(&scale.reverse_keyed_ids(), &self.settings.reverse_keying))
    }

    fn run_retest(&self, summary: &mut RunSummary) -> Result<(), JobError> {
        let version = &self.settings.results_version;
        let candidates = self.store.retest_candidates(version)?;
        tracing::info!(pairs = candidates.len(), "loaded retest candidates");
        if candidates.is_empty() {
            return Ok(());
        }

        let scales = self.store.scale_definitions(1)?;
        let item_ids: Vec<QuestionId> = scales
            .iter()
            .flat_map(|s| s.item_ids())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let session_ids: Vec<SessionId> = candidates
            .iter()
            .flat_map(|c| [c.first_session_id.clone(), c.second_session_id.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let responses = self.store.session_responses(&session_ids, &item_ids)?;
        let sums = ScaleSums::from_responses(&responses, &scales, &self.settings.reverse_keying);

        let min_common = self.settings.thresholds.min_common_scales;
        let mut rows = Vec::new();
        for pair in &candidates {
            let unit = retest_unit(pair);
            match correlate(pair, &sums, min_common) {
                Ok(row) => {
                    tracing::debug!(
                        user_id = %pair.user_id,
                        r = row.r_pearson,
                        n_items = row.n_items_correlated,
                        "retest pair correlated"
                    );
                    rows.push(row);
                    summary.record(UnitOutcome::succeeded(unit, None));
                }
                Err(reason) => {
                    tracing::info!(user_id = %pair.user_id, reason = %reason, "retest pair skipped");
                    summary.record(UnitOutcome::skipped(unit, reason));
                }
            }
        }

        if !rows.is_empty() {
            let written = self
                .store
                .write_retest_pairs(&rows, self.settings.retest_write_policy)?;
            summary.rows_written += written.inserted;
        }
        Ok(())
    }
}

fn retest_unit(pair: &RetestCandidate) -> String {
    format!(
        "retest/{}:{}:{}",
        pair.user_id, pair.first_session_id, pair.second_session_id
    )
}

fn skip(unit: String, scale: &ScaleDefinition, reason: &RejectionReason) -> UnitOutcome {
    tracing::info!(scale_code = %scale.scale_code, reason = %reason, "scale skipped");
    UnitOutcome::skipped(unit, reason)
}
