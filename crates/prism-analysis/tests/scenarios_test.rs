//! End-to-end estimator scenarios on simulated survey data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use prism_analysis::loadings::FactorFitter;
use prism_analysis::matrix::{assemble, AssemblyRules, ScaleSums};
use prism_analysis::reliability::ReliabilityEstimator;
use prism_analysis::retest::correlate;
use prism_analysis::RejectionReason;
use prism_core::config::{ReverseKeying, Thresholds};
use prism_core::types::{
    QuestionId, ResponseRecord, ResultsVersion, RetestCandidate, ScaleDefinition, SessionId,
    UserId,
};

/// Each respondent answers every item with their true score plus N(0, 0.1²) noise.
fn parallel_items(n: usize, k: i64, seed: u64) -> Vec<ResponseRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.1).unwrap();
    let mut out = Vec::new();
    for s in 0..n {
        let truth: f64 = rng.gen_range(1.0..5.0);
        for q in 1..=k {
            out.push(ResponseRecord::new(
                format!("s{s:03}"),
                q,
                Some(truth + noise.sample(&mut rng)),
            ));
        }
    }
    out
}

fn ids(k: i64) -> Vec<QuestionId> {
    (1..=k).map(QuestionId).collect()
}

#[test]
fn test_scenario_parallel_items_high_alpha() {
    let rules = AssemblyRules::for_reliability(&Thresholds::default());
    let matrix = assemble(&parallel_items(60, 4, 7), &ids(4), &rules).unwrap();
    assert_eq!(matrix.n_respondents(), 60);

    let est = ReliabilityEstimator::default().estimate(&matrix);
    assert!(est.alpha.unwrap() > 0.95, "alpha = {:?}", est.alpha);
    assert!(est.omega.unwrap() > 0.0);
    assert!(est.split_half.rho.unwrap() > 0.95);
}

#[test]
fn test_scenario_49_respondents_rejected() {
    let rules = AssemblyRules::for_reliability(&Thresholds::default());
    let rejected = assemble(&parallel_items(49, 5, 11), &ids(5), &rules).unwrap_err();
    assert_eq!(
        rejected,
        RejectionReason::TooFewRespondents {
            found: 49,
            minimum: 50
        }
    );
}

#[test]
fn test_scenario_retest_three_common_scales() {
    let scales = vec![
        ScaleDefinition::new("A", &[1, 2]),
        ScaleDefinition::new("B", &[3, 4]),
        ScaleDefinition::new("C", &[5, 6]),
    ];
    let answers = |session: &str, values: [f64; 6]| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| ResponseRecord::new(session, i as i64 + 1, Some(v)))
            .collect::<Vec<_>>()
    };
    let mut responses = answers("first", [4.0, 6.0, 10.0, 10.0, 15.0, 15.0]);
    responses.extend(answers("second", [6.0, 6.0, 9.0, 10.0, 16.0, 17.0]));
    let sums = ScaleSums::from_responses(&responses, &scales, &ReverseKeying::default());

    let pair = RetestCandidate {
        user_id: UserId::from("u1"),
        first_session_id: SessionId::from("first"),
        second_session_id: SessionId::from("second"),
        results_version: ResultsVersion::from("v1"),
        days_between: 30,
    };
    let row = correlate(&pair, &sums, 3).unwrap();
    // Sums {A:10, B:20, C:30} vs {A:12, B:19, C:33}.
    assert_eq!(row.n_items_correlated, 3);
    assert_eq!(row.r_pearson, 0.982);
    assert!(row.p_value.is_some());
}

#[test]
fn test_scenario_noise_item_loads_near_zero() {
    let mut rng = StdRng::seed_from_u64(99);
    let noise = Normal::new(0.0, 0.5).unwrap();
    let mut responses = Vec::new();
    for s in 0..300 {
        let factor = noise.sample(&mut rng) * 2.0;
        for q in 1..=4i64 {
            let value = if q == 4 {
                noise.sample(&mut rng)
            } else {
                factor + noise.sample(&mut rng)
            };
            responses.push(ResponseRecord::new(format!("s{s:03}"), q, Some(value)));
        }
    }
    let rules = AssemblyRules::for_loadings(&Thresholds::default());
    let matrix = assemble(&responses, &ids(4), &rules).unwrap();
    let solution = FactorFitter::default().fit(&matrix).unwrap();

    let noise_item = solution.loading(QuestionId(4)).unwrap();
    assert!(noise_item.lambda_std.abs() < 0.2, "lambda = {}", noise_item.lambda_std);
    assert!(noise_item.theta > 0.95, "theta = {}", noise_item.theta);
    for q in 1..=3 {
        assert!(solution.loading(QuestionId(q)).unwrap().lambda_std > 0.8);
    }
}
