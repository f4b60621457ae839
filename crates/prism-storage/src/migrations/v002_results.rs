//! V002: versioned result tables written by the jobs.

pub const MIGRATION_SQL: &str = r#"
-- Internal consistency per (version, scale, cohort window).
CREATE TABLE IF NOT EXISTS psychometrics_reliability (
    results_version TEXT NOT NULL,
    scale_code TEXT NOT NULL,
    cohort_start TEXT NOT NULL,
    cohort_end TEXT NOT NULL,
    n_respondents INTEGER NOT NULL,
    alpha REAL,
    omega REAL,
    sem REAL,
    split_half_sb REAL,
    split_half_n INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    PRIMARY KEY (results_version, scale_code, cohort_start, cohort_end)
) STRICT;

-- Standardized single-factor loadings per (version, scale, item).
CREATE TABLE IF NOT EXISTS cfa_loadings (
    results_version TEXT NOT NULL,
    scale_code TEXT NOT NULL,
    question_id INTEGER NOT NULL,
    lambda_std REAL NOT NULL,
    theta REAL NOT NULL,
    PRIMARY KEY (results_version, scale_code, question_id)
) STRICT;

-- Global fit of the single-factor model per (version, scale).
CREATE TABLE IF NOT EXISTS cfa_fit (
    results_version TEXT NOT NULL,
    scale_code TEXT NOT NULL,
    n INTEGER NOT NULL,
    chi_square REAL NOT NULL,
    df INTEGER NOT NULL,
    p_value REAL,
    cfi REAL,
    tli REAL,
    rmsea REAL,
    srmr REAL NOT NULL,
    PRIMARY KEY (results_version, scale_code)
) STRICT;

-- Corrected item-total correlations per (version, scale, cohort window, item).
CREATE TABLE IF NOT EXISTS item_stats (
    results_version TEXT NOT NULL,
    scale_code TEXT NOT NULL,
    cohort_start TEXT NOT NULL,
    cohort_end TEXT NOT NULL,
    question_id INTEGER NOT NULL,
    r_it REAL,
    n_used INTEGER NOT NULL,
    PRIMARY KEY (results_version, scale_code, cohort_start, cohort_end, question_id)
) STRICT;

-- Test-retest correlation per session pair.
CREATE TABLE IF NOT EXISTS retest_pairs (
    user_id TEXT NOT NULL,
    scale_code TEXT NOT NULL,
    first_session_id TEXT NOT NULL,
    second_session_id TEXT NOT NULL,
    days_between INTEGER NOT NULL,
    r_pearson REAL NOT NULL,
    p_value REAL,
    n_items_correlated INTEGER NOT NULL,
    results_version TEXT NOT NULL,
    PRIMARY KEY (user_id, scale_code, first_session_id, second_session_id, results_version)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_retest_pairs_version ON retest_pairs(results_version);
"#;
