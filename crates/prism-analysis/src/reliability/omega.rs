//! McDonald's omega, single-factor SVD proxy.
//!
//! Missing-value policy: this estimator, and only this one, works on the
//! column-mean-imputed matrix ([`MissingValuePolicy::ColumnMeanImputation`]).
//! The matrix is then column-centered; the right-singular vector of the
//! largest singular value gives proxy loadings λᵢ = |vᵢ|, uniquenesses
//! ψᵢ = max(0, 1 − λᵢ²), and ω = (Σλ)² / ((Σλ)² + Σψ).

use nalgebra::DMatrix;
use prism_core::errors::EstimationError;

use crate::matrix::MissingValuePolicy;

/// Policy applied before the decomposition.
pub const OMEGA_MISSING_POLICY: MissingValuePolicy = MissingValuePolicy::ColumnMeanImputation;

const SVD_EPS: f64 = 1e-12;
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Omega proxy over a (possibly incomplete) response matrix.
pub fn omega_proxy(values: &DMatrix<f64>) -> Result<f64, EstimationError> {
    if values.ncols() < 2 || values.nrows() < 2 {
        return Err(EstimationError::Degenerate {
            reason: format!(
                "omega needs at least 2x2 data, got {}x{}",
                values.nrows(),
                values.ncols()
            ),
        });
    }

    let mut centered = OMEGA_MISSING_POLICY.apply(values)?;
    for mut col in centered.column_iter_mut() {
        let mean = col.mean();
        col.add_scalar_mut(-mean);
    }

    let svd = centered
        .try_svd(false, true, SVD_EPS, SVD_MAX_ITERATIONS)
        .ok_or(EstimationError::NonConvergence {
            iterations: SVD_MAX_ITERATIONS,
        })?;
    let v_t = svd.v_t.ok_or_else(|| EstimationError::Degenerate {
        reason: "SVD returned no right-singular vectors".to_string(),
    })?;

    // Singular values are not guaranteed to be sorted.
    let (first, sigma) = svd
        .singular_values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best });
    if !sigma.is_finite() || sigma <= SVD_EPS {
        return Err(EstimationError::Degenerate {
            reason: "centered matrix has no variance".to_string(),
        });
    }

    let loadings: Vec<f64> = v_t.row(first).iter().map(|v| v.abs()).collect();
    let sum_lambda: f64 = loadings.iter().sum();
    let sum_psi: f64 = loadings.iter().map(|l| (1.0 - l * l).max(0.0)).sum();

    let num = sum_lambda * sum_lambda;
    let denom = num + sum_psi;
    if !denom.is_finite() || denom <= 0.0 {
        return Err(EstimationError::Degenerate {
            reason: "omega denominator is not positive".to_string(),
        });
    }
    Ok(num / denom)
}
