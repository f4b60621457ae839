//! Corrected item-total correlations (item discrimination).

use nalgebra::DMatrix;

use crate::descriptive::pearson;
use crate::matrix::row_sums;

/// One item's discrimination: r(item, total − item) over `n_used` rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTotal {
    pub r_it: Option<f64>,
    pub n_used: usize,
}

/// Corrected item-total correlation for every column, in column order.
///
/// `r_it` is undefined for a zero-variance item or rest score.
pub fn corrected_item_total(values: &DMatrix<f64>) -> Vec<ItemTotal> {
    let totals = row_sums(values);
    (0..values.ncols())
        .map(|j| {
            let item: Vec<f64> = values.column(j).iter().copied().collect();
            let rest: Vec<f64> = totals.iter().zip(&item).map(|(t, v)| t - v).collect();
            ItemTotal {
                r_it: pearson(&item, &rest),
                n_used: item.iter().filter(|v| v.is_finite()).count(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_item_has_low_discrimination() {
        let m = DMatrix::from_fn(40, 4, |i, j| {
            if j == 3 {
                ((i * 13) % 5) as f64
            } else {
                (i % 8) as f64 + 0.1 * j as f64
            }
        });
        let stats = corrected_item_total(&m);
        assert_eq!(stats.len(), 4);
        assert!(stats[0].r_it.unwrap() > 0.9);
        assert!(stats[3].r_it.unwrap().abs() < stats[0].r_it.unwrap());
        assert_eq!(stats[0].n_used, 40);
    }

    #[test]
    fn test_constant_item_undefined() {
        let m = DMatrix::from_row_slice(4, 2, &[1.0, 3.0, 2.0, 3.0, 3.0, 3.0, 4.0, 3.0]);
        let stats = corrected_item_total(&m);
        assert!(stats[1].r_it.is_none());
    }
}
