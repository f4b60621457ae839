//! Cronbach's alpha.
//!
//! α = k/(k−1) · (1 − Σ Var(item) / Var(row sum)), sample variances (n − 1).

use nalgebra::DMatrix;

use crate::descriptive::sample_variance;
use crate::matrix::row_sums;

/// Cronbach's alpha over a complete-case matrix.
///
/// `None` when k ≤ 1, n < 2, or the total-score variance is not positive.
/// Never exceeds 1.
pub fn cronbach_alpha(values: &DMatrix<f64>) -> Option<f64> {
    let k = values.ncols();
    if k <= 1 || values.nrows() < 2 {
        return None;
    }

    let item_var_sum = (0..k)
        .map(|j| {
            let col: Vec<f64> = values.column(j).iter().copied().collect();
            sample_variance(&col)
        })
        .sum::<Option<f64>>()?;

    let total_var = sample_variance(&row_sums(values))?;
    if total_var <= 0.0 {
        return None;
    }

    let kf = k as f64;
    let alpha = (kf / (kf - 1.0)) * (1.0 - item_var_sum / total_var);
    alpha.is_finite().then(|| alpha.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_undefined() {
        let m = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert!(cronbach_alpha(&m).is_none());
    }

    #[test]
    fn test_identical_columns_alpha_one() {
        let col = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut flat = Vec::new();
        for v in col {
            flat.extend([v, v, v]);
        }
        let m = DMatrix::from_row_slice(5, 3, &flat);
        let a = cronbach_alpha(&m).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_variance_undefined() {
        let m = DMatrix::from_row_slice(3, 2, &[2.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
        assert!(cronbach_alpha(&m).is_none());
    }

    #[test]
    fn test_known_value() {
        // Item variances 1.0 and 1.0, total variance 3.0 -> 2 * (1 - 2/3) = 0.6667.
        let m = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 1.0, 3.0, 3.0]);
        let a = cronbach_alpha(&m).unwrap();
        assert!((a - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_negatively_correlated_items() {
        let m = DMatrix::from_row_slice(3, 2, &[1.0, 3.0, 2.0, 2.0, 3.0, 1.5]);
        let a = cronbach_alpha(&m).unwrap();
        assert!(a < 0.0);
    }
}
