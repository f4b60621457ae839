//! Property-based tests for estimator invariants.
//!
//! Uses proptest to fuzz-verify:
//!   - Cronbach's alpha never exceeds 1 and is undefined for one item
//!   - θ + λ² = 1 for every loading the factor fitter emits
//!   - assembly is deterministic and strictly listwise

use proptest::prelude::*;

use prism_analysis::loadings::FactorFitter;
use prism_analysis::matrix::{assemble, AssemblyRules, ResponseMatrix};
use prism_analysis::reliability::cronbach_alpha;
use prism_core::types::{QuestionId, ResponseRecord};

fn likert_rows(max_rows: usize, max_cols: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    (3..=max_rows, 1..=max_cols).prop_flat_map(|(n, k)| {
        prop::collection::vec(prop::collection::vec((1u8..=5).prop_map(f64::from), k), n)
    })
}

// ═══════════════════════════════════════════════════════════════════
// Reliability
// ═══════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_alpha_never_exceeds_one(rows in likert_rows(40, 6)) {
        let m = ResponseMatrix::from_rows(&rows);
        if let Some(alpha) = cronbach_alpha(m.values()) {
            prop_assert!(alpha <= 1.0, "alpha = {}", alpha);
        }
    }

    #[test]
    fn prop_alpha_undefined_for_single_item(col in prop::collection::vec(-10.0f64..10.0, 2..50)) {
        let rows: Vec<Vec<f64>> = col.into_iter().map(|v| vec![v]).collect();
        let m = ResponseMatrix::from_rows(&rows);
        prop_assert!(cronbach_alpha(m.values()).is_none());
    }

    #[test]
    fn prop_alpha_one_for_identical_columns(
        col in prop::collection::vec(1u8..=5, 3..40),
        k in 2usize..6,
    ) {
        prop_assume!(col.iter().any(|&v| v != col[0]));
        let rows: Vec<Vec<f64>> = col.iter().map(|&v| vec![f64::from(v); k]).collect();
        let alpha = cronbach_alpha(ResponseMatrix::from_rows(&rows).values()).unwrap();
        prop_assert!((alpha - 1.0).abs() < 1e-9, "alpha = {}", alpha);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Loadings
// ═══════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_theta_plus_lambda_squared_is_one(
        rows in (20usize..60, 3usize..6).prop_flat_map(|(n, k)| {
            prop::collection::vec(prop::collection::vec(-3.0f64..3.0, k), n)
        })
    ) {
        let fitter = FactorFitter { min_sample_size: 10, ..FactorFitter::default() };
        if let Ok(solution) = fitter.fit(&ResponseMatrix::from_rows(&rows)) {
            for l in &solution.loadings {
                prop_assert!(l.theta >= 0.0);
                prop_assert!((l.theta + l.lambda_std * l.lambda_std - 1.0).abs() < 1e-12);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Matrix assembly
// ═══════════════════════════════════════════════════════════════════

/// (session index, item index, answered?) cells for up to 20 sessions x 4 items.
fn sparse_cells() -> impl Strategy<Value = Vec<Vec<Option<u8>>>> {
    prop::collection::vec(prop::collection::vec(prop::option::weighted(0.85, 1u8..=5), 4), 1..20)
}

fn records(cells: &[Vec<Option<u8>>]) -> Vec<ResponseRecord> {
    cells
        .iter()
        .enumerate()
        .flat_map(|(s, row)| {
            row.iter().enumerate().map(move |(q, v)| {
                ResponseRecord::new(format!("s{s:02}"), q as i64 + 1, v.map(f64::from))
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_assembly_is_listwise(cells in sparse_cells()) {
        let items: Vec<QuestionId> = (1..=4).map(QuestionId).collect();
        let rules = AssemblyRules { min_items: 2, min_sample_size: 1 };
        let complete = cells.iter().filter(|row| row.iter().all(Option::is_some)).count();
        match assemble(&records(&cells), &items, &rules) {
            Ok(m) => {
                prop_assert_eq!(m.n_respondents(), complete);
                prop_assert!(!m.has_missing());
            }
            Err(_) => prop_assert_eq!(complete, 0),
        }
    }

    #[test]
    fn prop_assembly_is_order_independent(cells in sparse_cells()) {
        let items: Vec<QuestionId> = (1..=4).rev().map(QuestionId).collect();
        let rules = AssemblyRules { min_items: 2, min_sample_size: 1 };
        let forward = records(&cells);
        let mut backward = forward.clone();
        backward.reverse();
        prop_assert_eq!(assemble(&forward, &items, &rules), assemble(&backward, &items, &rules));
    }
}
