//! Top-level PRISM configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::run_settings::{ReverseKeying, RunSettings, SplitHalfSettings, Thresholds};
use super::{AnalysisConfig, RunConfig, StoreConfig};
use crate::constants;
use crate::errors::ConfigError;
use crate::types::{CohortWindow, ResultsVersion};

/// Top-level configuration aggregating all sections.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`PRISM_*`)
/// 3. Project config (`prism.toml` in the working directory)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrismConfig {
    pub run: RunConfig,
    pub analysis: AnalysisConfig,
    pub store: StoreConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub results_version: Option<String>,
    pub cohort_start: Option<String>,
    pub cohort_end: Option<String>,
    pub min_sample_size: Option<usize>,
    pub min_items: Option<usize>,
}

impl PrismConfig {
    /// Load configuration with layered resolution.
    ///
    /// `root` is searched for `prism.toml` unless the CLI names a config file,
    /// in which case that file must exist.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3: project config
        match cli_overrides.and_then(|cli| cli.config_path.as_deref()) {
            Some(explicit) => Self::merge_toml_file(&mut config, explicit)?,
            None => {
                let project_config_path = root.join(constants::PROJECT_CONFIG_FILE);
                if project_config_path.exists() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1: CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values that are present.
    pub fn validate(config: &PrismConfig) -> Result<(), ConfigError> {
        let analysis = &config.analysis;
        if analysis.effective_min_sample_size() < 2 {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.min_sample_size".to_string(),
                message: "must be at least 2".to_string(),
            });
        }
        if analysis.effective_min_items() < 1 {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.min_items".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if analysis.effective_min_items_for_cfa() < 3 {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.min_items_for_cfa".to_string(),
                message: "a single-factor model needs at least 3 items".to_string(),
            });
        }
        if analysis.effective_min_common_scales() < 3 {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.min_common_scales".to_string(),
                message: "a correlation needs at least 3 paired points".to_string(),
            });
        }
        if analysis.effective_split_half_iterations() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.split_half_iterations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let (low, high) = analysis.effective_response_range();
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ConfigError::ValidationFailed {
                field: "analysis.response_min".to_string(),
                message: format!("response range [{low}, {high}] is empty"),
            });
        }
        if let Some(version) = &config.run.results_version {
            if version.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "run.results_version".to_string(),
                    message: "must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the explicit settings object for a run.
    ///
    /// Fails when the results version is missing or the cohort window is
    /// half-specified or malformed.
    pub fn run_settings(&self) -> Result<RunSettings, ConfigError> {
        let version = self
            .run
            .results_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "run.results_version".to_string(),
            })?;

        let cohort = match (&self.run.cohort_start, &self.run.cohort_end) {
            (Some(start), Some(end)) => Some(CohortWindow::parse(start, end)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingField {
                    field: "run.cohort_end".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingField {
                    field: "run.cohort_start".to_string(),
                })
            }
        };

        let analysis = &self.analysis;
        let (response_min, response_max) = analysis.effective_response_range();
        Ok(RunSettings {
            results_version: ResultsVersion::new(version),
            cohort,
            thresholds: Thresholds {
                min_sample_size: analysis.effective_min_sample_size(),
                min_items: analysis.effective_min_items(),
                min_items_for_cfa: analysis.effective_min_items_for_cfa(),
                min_common_scales: analysis.effective_min_common_scales(),
            },
            split_half: SplitHalfSettings {
                iterations: analysis.effective_split_half_iterations(),
                seed: analysis.effective_split_half_seed(),
            },
            reverse_keying: ReverseKeying {
                enabled: analysis.effective_reverse_key_items(),
                response_min,
                response_max,
            },
            retest_write_policy: self.run.effective_retest_write_policy(),
        })
    }

    /// The database path, required before a store can be opened.
    pub fn database_path(&self) -> Result<&Path, ConfigError> {
        self.store
            .database_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "store.database_path".to_string(),
            })
    }

    /// Merge a TOML file into the existing config.
    fn merge_toml_file(config: &mut PrismConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: PrismConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `Some` values in `other` win.
    fn merge(base: &mut PrismConfig, other: &PrismConfig) {
        // Run
        if other.run.results_version.is_some() {
            base.run.results_version = other.run.results_version.clone();
        }
        if other.run.cohort_start.is_some() {
            base.run.cohort_start = other.run.cohort_start.clone();
        }
        if other.run.cohort_end.is_some() {
            base.run.cohort_end = other.run.cohort_end.clone();
        }
        if other.run.retest_write_policy.is_some() {
            base.run.retest_write_policy = other.run.retest_write_policy;
        }

        // Analysis
        let (b, o) = (&mut base.analysis, &other.analysis);
        if o.min_sample_size.is_some() {
            b.min_sample_size = o.min_sample_size;
        }
        if o.min_items.is_some() {
            b.min_items = o.min_items;
        }
        if o.min_items_for_cfa.is_some() {
            b.min_items_for_cfa = o.min_items_for_cfa;
        }
        if o.min_common_scales.is_some() {
            b.min_common_scales = o.min_common_scales;
        }
        if o.split_half_iterations.is_some() {
            b.split_half_iterations = o.split_half_iterations;
        }
        if o.split_half_seed.is_some() {
            b.split_half_seed = o.split_half_seed;
        }
        if o.reverse_key_items.is_some() {
            b.reverse_key_items = o.reverse_key_items;
        }
        if o.response_min.is_some() {
            b.response_min = o.response_min;
        }
        if o.response_max.is_some() {
            b.response_max = o.response_max;
        }

        // Store
        if other.store.database_path.is_some() {
            base.store.database_path = other.store.database_path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Unparsable numeric values are configuration errors, not silently ignored.
    fn apply_env_overrides(config: &mut PrismConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("PRISM_RESULTS_VERSION") {
            config.run.results_version = Some(val);
        }
        if let Ok(val) = std::env::var("PRISM_COHORT_START") {
            config.run.cohort_start = Some(val);
        }
        if let Ok(val) = std::env::var("PRISM_COHORT_END") {
            config.run.cohort_end = Some(val);
        }
        if let Ok(val) = std::env::var("PRISM_DATABASE_PATH") {
            config.store.database_path = Some(PathBuf::from(val));
        }
        if let Some(v) = env_usize("PRISM_MIN_SAMPLE_SIZE")? {
            config.analysis.min_sample_size = Some(v);
        }
        if let Some(v) = env_usize("PRISM_MIN_ITEMS")? {
            config.analysis.min_items = Some(v);
        }
        if let Some(v) = env_usize("PRISM_MIN_ITEMS_FOR_CFA")? {
            config.analysis.min_items_for_cfa = Some(v);
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut PrismConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.results_version {
            config.run.results_version = Some(v.clone());
        }
        if let Some(ref v) = cli.cohort_start {
            config.run.cohort_start = Some(v.clone());
        }
        if let Some(ref v) = cli.cohort_end {
            config.run.cohort_end = Some(v.clone());
        }
        if let Some(ref v) = cli.database_path {
            config.store.database_path = Some(v.clone());
        }
        if let Some(v) = cli.min_sample_size {
            config.analysis.min_sample_size = Some(v);
        }
        if let Some(v) = cli.min_items {
            config.analysis.min_items = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                message: format!("'{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
