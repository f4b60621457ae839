//! Per-unit outcomes and the run summary.

use std::fmt;

use serde::Serialize;

use prism_core::types::{CohortWindow, ResultsVersion};

/// Which statistic families a run computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Reliability,
    Loadings,
    Retest,
    All,
}

impl JobKind {
    pub fn includes_reliability(self) -> bool {
        matches!(self, Self::Reliability | Self::All)
    }

    pub fn includes_loadings(self) -> bool {
        matches!(self, Self::Loadings | Self::All)
    }

    pub fn includes_retest(self) -> bool {
        matches!(self, Self::Retest | Self::All)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reliability => "reliability",
            Self::Loadings => "loadings",
            Self::Retest => "retest",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Skipped,
    Errored,
}

/// What happened to one scale or pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    /// `family/key`, e.g. `reliability/EXT` or `retest/u1:a:b`.
    pub unit: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl UnitOutcome {
    pub fn succeeded(unit: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            unit: unit.into(),
            outcome: Outcome::Succeeded,
            detail,
        }
    }

    pub fn skipped(unit: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            unit: unit.into(),
            outcome: Outcome::Skipped,
            detail: Some(reason.to_string()),
        }
    }

    pub fn errored(unit: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            unit: unit.into(),
            outcome: Outcome::Errored,
            detail: Some(error.to_string()),
        }
    }
}

/// Machine-readable summary printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub job: JobKind,
    pub results_version: ResultsVersion,
    pub cohort: Option<String>,
    pub succeeded: usize,
    pub skipped: usize,
    pub errored: usize,
    pub rows_written: usize,
    pub units: Vec<UnitOutcome>,
}

impl RunSummary {
    pub fn new(job: JobKind, results_version: ResultsVersion, cohort: Option<CohortWindow>) -> Self {
        Self {
            job,
            results_version,
            cohort: cohort.map(|c| c.to_string()),
            succeeded: 0,
            skipped: 0,
            errored: 0,
            rows_written: 0,
            units: Vec::new(),
        }
    }

    pub fn record(&mut self, unit: UnitOutcome) {
        match unit.outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Errored => self.errored += 1,
        }
        self.units.push(unit);
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }

    /// Process exit status: 0 when no unit errored, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_errors())
    }
}
