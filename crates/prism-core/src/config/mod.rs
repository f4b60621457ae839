//! Configuration system for PRISM.
//! TOML-based, layered resolution: CLI > env > project file > defaults.

pub mod analysis_config;
pub mod prism_config;
pub mod run_config;
pub mod run_settings;
pub mod store_config;

pub use analysis_config::AnalysisConfig;
pub use prism_config::{CliOverrides, PrismConfig};
pub use run_config::RunConfig;
pub use run_settings::{ReverseKeying, RunSettings, SplitHalfSettings, Thresholds};
pub use store_config::StoreConfig;
