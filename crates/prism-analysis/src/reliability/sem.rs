//! Standard error of measurement.

use nalgebra::DMatrix;

use crate::descriptive::sample_sd;
use crate::matrix::{row_sums, MissingValuePolicy};

/// SEM = SD(row sum) · sqrt(max(0, 1 − α)).
///
/// An undefined alpha counts as 0, which bounds SEM from above instead of
/// leaving it undefined. Row sums are taken over the column-mean-imputed
/// matrix, so complete-case input passes through unchanged.
pub fn standard_error_of_measurement(values: &DMatrix<f64>, alpha: Option<f64>) -> Option<f64> {
    let filled = MissingValuePolicy::ColumnMeanImputation.apply(values).ok()?;
    let sd = sample_sd(&row_sums(&filled))?;
    let sem = sd * (1.0 - alpha.unwrap_or(0.0)).max(0.0).sqrt();
    sem.is_finite().then_some(sem)
}
