//! Randomized split-half reliability with the Spearman-Brown correction.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use prism_core::config::SplitHalfSettings;

use crate::descriptive::pearson;
use crate::matrix::MissingValuePolicy;

/// Median Spearman-Brown coefficient over `n` random splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitHalf {
    pub rho: Option<f64>,
    pub n: usize,
}

impl SplitHalf {
    fn undefined() -> Self {
        Self { rho: None, n: 0 }
    }
}

/// Spearman-Brown prophecy for doubling test length: 2r / (1 + r).
pub fn spearman_brown(r: f64) -> Option<f64> {
    let denom = 1.0 + r;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let rho = 2.0 * r / denom;
    rho.is_finite().then_some(rho)
}

/// Shuffle the item columns `settings.iterations` times with a seeded RNG,
/// assign even positions to one half and odd positions to the other, and
/// correlate the half sums.
///
/// Needs at least 3 rows and 2 columns. Splits with an undefined
/// correlation are dropped; `n` counts the splits that contributed. The
/// reported value is the upper median, clamped to [−1, 1].
pub fn split_half(values: &DMatrix<f64>, settings: &SplitHalfSettings) -> SplitHalf {
    let (rows, cols) = values.shape();
    if rows < 3 || cols < 2 || settings.iterations == 0 {
        return SplitHalf::undefined();
    }
    let Ok(filled) = MissingValuePolicy::ColumnMeanImputation.apply(values) else {
        return SplitHalf::undefined();
    };

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut order: Vec<usize> = (0..cols).collect();
    let mut rhos = Vec::with_capacity(settings.iterations);

    for _ in 0..settings.iterations {
        order.shuffle(&mut rng);
        let mut half_a = vec![0.0; rows];
        let mut half_b = vec![0.0; rows];
        for (pos, &j) in order.iter().enumerate() {
            let target = if pos % 2 == 0 { &mut half_a } else { &mut half_b };
            for (i, v) in filled.column(j).iter().enumerate() {
                target[i] += v;
            }
        }
        if let Some(rho) = pearson(&half_a, &half_b).and_then(spearman_brown) {
            rhos.push(rho);
        }
    }

    if rhos.is_empty() {
        return SplitHalf::undefined();
    }
    rhos.sort_by(f64::total_cmp);
    SplitHalf {
        rho: Some(rhos[rhos.len() / 2].clamp(-1.0, 1.0)),
        n: rhos.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SplitHalfSettings {
        SplitHalfSettings {
            iterations: 50,
            seed: 42,
        }
    }

    fn consistent(n: usize, k: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, k, |i, j| (i % 7) as f64 + 0.05 * (((i + j * 3) % 3) as f64))
    }

    #[test]
    fn test_spearman_brown() {
        assert!((spearman_brown(0.5).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!(spearman_brown(-1.0).is_none());
    }

    #[test]
    fn test_consistent_items_high_split_half() {
        let sh = split_half(&consistent(30, 4), &settings());
        assert!(sh.rho.unwrap() > 0.95);
        assert_eq!(sh.n, 50);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let m = consistent(30, 5);
        assert_eq!(split_half(&m, &settings()), split_half(&m, &settings()));
    }

    #[test]
    fn test_too_few_rows_undefined() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(split_half(&m, &settings()), SplitHalf { rho: None, n: 0 });
    }

    #[test]
    fn test_single_column_undefined() {
        let m = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert!(split_half(&m, &settings()).rho.is_none());
    }
}
