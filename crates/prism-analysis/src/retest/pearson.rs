//! Pearson correlation with a two-sided t-test.
//!
//! Uses the Student's t distribution via `statrs`.

use statrs::distribution::{ContinuousCDF, StudentsT};

use prism_core::errors::EstimationError;

/// r and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: Option<f64>,
    pub n: usize,
}

/// Pearson's r over paired observations, with significance
/// t = r·√((n − 2)/(1 − r²)) on n − 2 degrees of freedom.
///
/// Fails on mismatched lengths, fewer than 3 pairs, non-finite values, or a
/// zero-variance side.
pub fn pearson_with_significance(x: &[f64], y: &[f64]) -> Result<Correlation, EstimationError> {
    if x.len() != y.len() {
        return Err(EstimationError::Degenerate {
            reason: format!("paired vectors differ in length ({} vs {})", x.len(), y.len()),
        });
    }
    let n = x.len();
    if n < 3 {
        return Err(EstimationError::TooFewRespondents { found: n, minimum: 3 });
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(EstimationError::Degenerate {
            reason: "non-finite value in paired vectors".to_string(),
        });
    }

    let nf = n as f64;
    let mx = x.iter().sum::<f64>() / nf;
    let my = y.iter().sum::<f64>() / nf;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 {
        return Err(EstimationError::ZeroVariance {
            item: "first session".to_string(),
        });
    }
    if syy <= 0.0 {
        return Err(EstimationError::ZeroVariance {
            item: "second session".to_string(),
        });
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    Ok(Correlation {
        r,
        p_value: two_sided_p(r, n),
        n,
    })
}

fn two_sided_p(r: f64, n: usize) -> Option<f64> {
    let df = n as f64 - 2.0;
    if df <= 0.0 {
        return None;
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some(0.0); // |r| = 1
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * dist.sf(t.abs());
    p.is_finite().then(|| p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_correlation_p_zero() {
        let c = pearson_with_significance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.p_value, Some(0.0));
    }

    #[test]
    fn test_known_p_value() {
        // r = 0.5, n = 10: t = 1.633, df = 8 -> p ≈ 0.1411.
        let p = two_sided_p(0.5, 10).unwrap();
        assert!((p - 0.1411).abs() < 1e-3, "p = {p}");
    }

    #[test]
    fn test_zero_variance_rejected() {
        let err = pearson_with_significance(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, EstimationError::ZeroVariance { .. }));
    }

    #[test]
    fn test_too_few_pairs() {
        assert!(pearson_with_significance(&[1.0, 2.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(pearson_with_significance(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
    }
}
