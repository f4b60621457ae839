//! `prism-jobs`: batch entry point.
//!
//! Exit status: 0 when no unit errored, 1 when any unit errored, 2 on a fatal
//! configuration or persistence error.

use std::process::ExitCode;

use clap::Parser;
use prism_core::config::PrismConfig;
use prism_core::errors::{JobError, PrismErrorCode};
use prism_core::tracing::init_tracing;
use prism_jobs::cli::{Cli, EXIT_FATAL};
use prism_jobs::{Orchestrator, RunSummary};
use prism_storage::SqliteStore;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to serialize run summary"),
            }
            ExitCode::from(summary.exit_code())
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "run aborted");
            eprintln!("{}", e.summary_string());
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: &Cli) -> Result<RunSummary, JobError> {
    let cwd = std::env::current_dir().map_err(|e| {
        JobError::from(prism_core::errors::ConfigError::InvalidValue {
            field: "working directory".to_string(),
            message: e.to_string(),
        })
    })?;
    let config = PrismConfig::load(&cwd, Some(&cli.overrides()))?;
    let settings = config.run_settings()?;
    let store = SqliteStore::open(config.database_path()?)?;

    tracing::info!(
        job = %cli.command.job(),
        results_version = %settings.results_version,
        "starting run"
    );
    Orchestrator::new(&store, settings).run(cli.command.job())
}
