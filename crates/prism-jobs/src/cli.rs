//! Command-line surface of the `prism-jobs` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prism_core::config::CliOverrides;

use crate::outcome::JobKind;

/// Exit status for a fatal configuration or persistence error.
pub const EXIT_FATAL: u8 = 2;

/// Compute psychometric quality metrics for survey scales
#[derive(Parser, Debug)]
#[command(name = "prism-jobs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ./prism.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database holding source and result tables
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Tag written with every result row
    #[arg(long, global = true)]
    pub results_version: Option<String>,

    /// Cohort window start (YYYY-MM-DD, inclusive)
    #[arg(long, global = true)]
    pub cohort_start: Option<String>,

    /// Cohort window end (YYYY-MM-DD, exclusive)
    #[arg(long, global = true)]
    pub cohort_end: Option<String>,

    /// Minimum complete-case respondents per scale
    #[arg(long, global = true)]
    pub min_sample_size: Option<usize>,

    /// Minimum items per scale
    #[arg(long, global = true)]
    pub min_items: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Cronbach's alpha, omega, SEM, split-half and item-total statistics per scale
    Reliability,
    /// Single-factor loadings and fit indices per scale
    Loadings,
    /// Test-retest correlation per candidate session pair
    Retest,
    /// Reliability and loadings, then retest
    All,
}

impl Command {
    pub fn job(self) -> JobKind {
        match self {
            Self::Reliability => JobKind::Reliability,
            Self::Loadings => JobKind::Loadings,
            Self::Retest => JobKind::Retest,
            Self::All => JobKind::All,
        }
    }
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_path: self.config.clone(),
            database_path: self.database.clone(),
            results_version: self.results_version.clone(),
            cohort_start: self.cohort_start.clone(),
            cohort_end: self.cohort_end.clone(),
            min_sample_size: self.min_sample_size,
            min_items: self.min_items,
        }
    }
}
