//! Global fit indices for the one-factor model.

use nalgebra::DMatrix;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// χ², df, p-value, CFI, TLI, RMSEA and SRMR.
///
/// With df = 0 (three items) the model is just-identified: `p_value`, `cfi`,
/// `tli` and `rmsea` are undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitIndices {
    pub chi_square: f64,
    pub df: usize,
    pub p_value: Option<f64>,
    pub cfi: Option<f64>,
    pub tli: Option<f64>,
    pub rmsea: Option<f64>,
    pub srmr: f64,
}

/// Degrees of freedom of the one-factor model: p(p+1)/2 − 2p = p(p−3)/2.
pub fn model_df(p: usize) -> usize {
    p * p.saturating_sub(3) / 2
}

/// Compute fit indices from the ML discrepancy and the independence baseline.
///
/// `f_ml`: minimised discrepancy. `ln_det_r`: ln|R| of the sample
/// correlation matrix. `r`, `sigma`: sample and implied matrices.
pub fn fit_indices(
    n: usize,
    f_ml: f64,
    ln_det_r: f64,
    r: &DMatrix<f64>,
    sigma: &DMatrix<f64>,
) -> FitIndices {
    let p = r.nrows();
    let scale = n.saturating_sub(1) as f64;
    let chi_square = scale * f_ml;
    let df = model_df(p);
    let srmr = srmr(r, sigma);

    if df == 0 {
        return FitIndices {
            chi_square,
            df,
            p_value: None,
            cfi: None,
            tli: None,
            rmsea: None,
            srmr,
        };
    }

    let dff = df as f64;
    let chi_base = (-scale * ln_det_r).max(0.0);
    let df_base = (p * (p - 1) / 2) as f64;

    let p_value = ChiSquared::new(dff)
        .ok()
        .map(|dist| dist.sf(chi_square))
        .filter(|v| v.is_finite());

    let d_model = (chi_square - dff).max(0.0);
    let d_base = (chi_base - df_base).max(0.0);
    let cfi_denom = d_model.max(d_base);
    let cfi = if cfi_denom > 0.0 {
        1.0 - d_model / cfi_denom
    } else {
        1.0
    };

    let base_ratio = chi_base / df_base;
    let tli_denom = base_ratio - 1.0;
    let tli = (tli_denom.abs() > f64::EPSILON)
        .then(|| (base_ratio - chi_square / dff) / tli_denom)
        .filter(|v| v.is_finite());

    let rmsea = (scale > 0.0)
        .then(|| (d_model / (dff * scale)).sqrt())
        .filter(|v| v.is_finite());

    FitIndices {
        chi_square,
        df,
        p_value,
        cfi: Some(cfi),
        tli,
        rmsea,
        srmr,
    }
}

/// Standardized root mean square residual over the lower triangle,
/// diagonal included.
pub fn srmr(r: &DMatrix<f64>, sigma: &DMatrix<f64>) -> f64 {
    let p = r.nrows();
    if p == 0 {
        return 0.0;
    }
    let mut ss = 0.0;
    for i in 0..p {
        for j in 0..=i {
            let observed = r[(i, j)] / (r[(i, i)] * r[(j, j)]).sqrt();
            let fitted = sigma[(i, j)] / (sigma[(i, i)] * sigma[(j, j)]).sqrt();
            ss += (observed - fitted).powi(2);
        }
    }
    (ss / (p * (p + 1) / 2) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_df() {
        assert_eq!(model_df(3), 0);
        assert_eq!(model_df(4), 2);
        assert_eq!(model_df(5), 5);
        assert_eq!(model_df(2), 0);
    }

    #[test]
    fn test_just_identified_has_no_incremental_indices() {
        let r = DMatrix::identity(3, 3);
        let fit = fit_indices(100, 0.0, 0.0, &r, &r);
        assert_eq!(fit.df, 0);
        assert!(fit.p_value.is_none());
        assert!(fit.cfi.is_none());
        assert!(fit.rmsea.is_none());
        assert_eq!(fit.srmr, 0.0);
    }

    #[test]
    fn test_perfect_fit() {
        let mut r = DMatrix::from_element(4, 4, 0.5);
        r.fill_diagonal(1.0);
        let ln_det_r = r.clone().cholesky().unwrap().l().diagonal().map(f64::ln).sum() * 2.0;
        let fit = fit_indices(200, 0.0, ln_det_r, &r, &r);
        assert_eq!(fit.chi_square, 0.0);
        assert_eq!(fit.cfi, Some(1.0));
        assert_eq!(fit.rmsea, Some(0.0));
        assert!((fit.p_value.unwrap() - 1.0).abs() < 1e-12);
        assert!(fit.tli.unwrap() > 1.0);
    }

    #[test]
    fn test_poor_fit_lowers_cfi() {
        let mut r = DMatrix::from_element(4, 4, 0.5);
        r.fill_diagonal(1.0);
        let ln_det_r = r.clone().cholesky().unwrap().l().diagonal().map(f64::ln).sum() * 2.0;
        let good = fit_indices(200, 0.01, ln_det_r, &r, &r);
        let bad = fit_indices(200, 0.5, ln_det_r, &r, &r);
        assert!(bad.cfi.unwrap() < good.cfi.unwrap());
        assert!(bad.rmsea.unwrap() > good.rmsea.unwrap());
        assert!(bad.p_value.unwrap() < 0.001);
    }
}
