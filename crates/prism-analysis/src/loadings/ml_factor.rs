//! Maximum-likelihood single-factor extraction on the correlation matrix.
//!
//! EM iterations for the one-factor model R ≈ λλ' + Ψ, initialised from the
//! leading eigenpair of R. Uniquenesses are floored at [`PSI_FLOOR`] to keep
//! Ψ invertible (Heywood cases).

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use prism_core::errors::EstimationError;
use prism_core::types::QuestionId;

/// Lower bound for every uniqueness during estimation.
pub const PSI_FLOOR: f64 = 0.005;

const EIGEN_EPS: f64 = 1e-12;
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Converged one-factor solution in correlation metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MlSolution {
    pub lambda: DVector<f64>,
    pub psi: DVector<f64>,
    pub iterations: usize,
}

/// Sample correlation matrix of a complete-case matrix.
///
/// Fails with `ZeroVariance` naming the first constant item.
pub fn correlation_matrix(
    values: &DMatrix<f64>,
    item_ids: &[QuestionId],
) -> Result<DMatrix<f64>, EstimationError> {
    let (n, p) = values.shape();
    if n < 2 {
        return Err(EstimationError::TooFewRespondents {
            found: n,
            minimum: 2,
        });
    }
    let mut centered = values.clone();
    for mut col in centered.column_iter_mut() {
        let mean = col.mean();
        col.add_scalar_mut(-mean);
    }
    let cov = centered.transpose() * &centered / (n as f64 - 1.0);

    let mut sd = DVector::<f64>::zeros(p);
    for j in 0..p {
        let var = cov[(j, j)];
        if !var.is_finite() || var <= f64::EPSILON {
            let item = item_ids
                .get(j)
                .map_or_else(|| format!("column {j}"), ToString::to_string);
            return Err(EstimationError::ZeroVariance { item });
        }
        sd[j] = var.sqrt();
    }

    Ok(DMatrix::from_fn(p, p, |i, j| {
        if i == j {
            1.0
        } else {
            (cov[(i, j)] / (sd[i] * sd[j])).clamp(-1.0, 1.0)
        }
    }))
}

/// Smallest admissible squared Cholesky pivot. For a correlation matrix the
/// pivot is the item's residual variance given the preceding items.
const RANK_TOLERANCE: f64 = 1e-10;

/// ln|A| from a Cholesky factorization; `None` if A is not numerically
/// positive definite.
pub fn ln_det(a: &DMatrix<f64>) -> Option<f64> {
    let chol = a.clone().cholesky()?;
    let diag = chol.l().diagonal();
    if diag.iter().any(|d| d * d < RANK_TOLERANCE) {
        return None;
    }
    let ld = 2.0 * diag.iter().map(|d| d.ln()).sum::<f64>();
    ld.is_finite().then_some(ld)
}

/// Fit λ and Ψ by EM until the largest parameter change drops below `tolerance`.
pub fn fit_em(
    r: &DMatrix<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<MlSolution, EstimationError> {
    let p = r.nrows();
    let (mut lambda, mut psi) = initial_estimates(r)?;

    for iteration in 1..=max_iterations {
        let psi_inv_lambda = lambda.component_div(&psi);
        let g = lambda.dot(&psi_inv_lambda);
        let beta = psi_inv_lambda / (1.0 + g);
        let r_beta = r * &beta;
        let c = 1.0 - g / (1.0 + g) + beta.dot(&r_beta);
        if !c.is_finite() || c <= 0.0 {
            return Err(EstimationError::Degenerate {
                reason: "factor second moment is not positive".to_string(),
            });
        }

        let next_lambda = &r_beta / c;
        let next_psi = DVector::from_fn(p, |i, _| {
            (r[(i, i)] - next_lambda[i] * r_beta[i]).max(PSI_FLOOR)
        });

        let delta = (&next_lambda - &lambda)
            .amax()
            .max((&next_psi - &psi).amax());
        lambda = next_lambda;
        psi = next_psi;

        if !delta.is_finite() {
            return Err(EstimationError::Degenerate {
                reason: "EM update produced non-finite parameters".to_string(),
            });
        }
        if delta < tolerance {
            return Ok(MlSolution {
                lambda,
                psi,
                iterations: iteration,
            });
        }
    }

    Err(EstimationError::NonConvergence {
        iterations: max_iterations,
    })
}

/// Leading principal component scaled to loadings: λ = v·√e, ψ = 1 − λ².
fn initial_estimates(r: &DMatrix<f64>) -> Result<(DVector<f64>, DVector<f64>), EstimationError> {
    let eigen = SymmetricEigen::try_new(r.clone(), EIGEN_EPS, EIGEN_MAX_ITERATIONS).ok_or(
        EstimationError::NonConvergence {
            iterations: EIGEN_MAX_ITERATIONS,
        },
    )?;
    let (first, value) = eigen
        .eigenvalues
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, e)| if e > best.1 { (i, e) } else { best });
    if !value.is_finite() || value <= 0.0 {
        return Err(EstimationError::RankDeficient);
    }
    let lambda: DVector<f64> = eigen.eigenvectors.column(first) * value.sqrt();
    let psi = lambda.map(|l| (1.0 - l * l).max(PSI_FLOOR));
    Ok((lambda, psi))
}

/// Model-implied matrix Σ = λλ' + Ψ.
pub fn implied(lambda: &DVector<f64>, psi: &DVector<f64>) -> DMatrix<f64> {
    lambda * lambda.transpose() + DMatrix::from_diagonal(psi)
}

/// ML discrepancy F = ln|Σ| − ln|R| + tr(Σ⁻¹R) − p.
pub fn discrepancy(r: &DMatrix<f64>, sigma: &DMatrix<f64>) -> Result<f64, EstimationError> {
    let ln_det_r = ln_det(r).ok_or(EstimationError::RankDeficient)?;
    let chol = sigma
        .clone()
        .cholesky()
        .ok_or_else(|| EstimationError::Degenerate {
            reason: "implied covariance is not positive definite".to_string(),
        })?;
    let ln_det_sigma = 2.0 * chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    let trace = chol.inverse().component_mul(r).sum();
    let f = ln_det_sigma - ln_det_r + trace - r.nrows() as f64;
    if !f.is_finite() {
        return Err(EstimationError::Degenerate {
            reason: "ML discrepancy is not finite".to_string(),
        });
    }
    Ok(f.max(0.0))
}
