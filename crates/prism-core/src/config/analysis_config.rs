//! Analysis thresholds.

use serde::{Deserialize, Serialize};

use crate::constants;

/// `[analysis]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum complete-case respondents. Default: 50.
    pub min_sample_size: Option<usize>,
    /// Minimum items for reliability. Default: 2.
    pub min_items: Option<usize>,
    /// Minimum items for the single-factor fit. Default: 3.
    pub min_items_for_cfa: Option<usize>,
    /// Minimum common scales for a retest correlation. Default: 3.
    pub min_common_scales: Option<usize>,
    /// Random splits for split-half reliability. Default: 200.
    pub split_half_iterations: Option<usize>,
    /// PRNG seed for split-half reliability. Default: 42.
    pub split_half_seed: Option<u64>,
    /// Reverse-code items with a negative scale weight. Default: false.
    pub reverse_key_items: Option<bool>,
    /// Lowest response option. Default: 1.
    pub response_min: Option<f64>,
    /// Highest response option. Default: 5.
    pub response_max: Option<f64>,
}

impl AnalysisConfig {
    pub fn effective_min_sample_size(&self) -> usize {
        self.min_sample_size.unwrap_or(constants::DEFAULT_MIN_SAMPLE_SIZE)
    }

    pub fn effective_min_items(&self) -> usize {
        self.min_items.unwrap_or(constants::DEFAULT_MIN_ITEMS)
    }

    pub fn effective_min_items_for_cfa(&self) -> usize {
        self.min_items_for_cfa.unwrap_or(constants::DEFAULT_MIN_ITEMS_FOR_CFA)
    }

    pub fn effective_min_common_scales(&self) -> usize {
        self.min_common_scales.unwrap_or(constants::DEFAULT_MIN_COMMON_SCALES)
    }

    pub fn effective_split_half_iterations(&self) -> usize {
        self.split_half_iterations
            .unwrap_or(constants::DEFAULT_SPLIT_HALF_ITERATIONS)
    }

    pub fn effective_split_half_seed(&self) -> u64 {
        self.split_half_seed.unwrap_or(constants::DEFAULT_SPLIT_HALF_SEED)
    }

    pub fn effective_reverse_key_items(&self) -> bool {
        self.reverse_key_items.unwrap_or(false)
    }

    pub fn effective_response_range(&self) -> (f64, f64) {
        (
            self.response_min.unwrap_or(constants::DEFAULT_RESPONSE_MIN),
            self.response_max.unwrap_or(constants::DEFAULT_RESPONSE_MAX),
        )
    }
}
