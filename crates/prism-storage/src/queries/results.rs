//! Result table writes and the matching reads.
//!
//! Scale families are replaced by scope: every stored row the batch's
//! [`ScaleResultScope`] covers is deleted before the new rows go in, so a
//! scale skipped on a re-run loses its old rows. Write functions run on the
//! caller's open transaction; the caller owns commit and rollback.

use std::collections::BTreeSet;

use prism_core::errors::StorageError;
use prism_core::traits::{RetestWritePolicy, WriteSummary};
use prism_core::types::{
    CfaFitResult, CohortWindow, ItemStatResult, LoadingResult, QuestionId, ReliabilityResult,
    ResultsVersion, RetestPairResult, ScaleCode, ScaleResultBatch, ScaleResultScope, SessionId,
    UserId,
};
use rusqlite::{params, Connection};

use super::{count_i64, count_usize, sqlite_error};

/// Distinct (version, scale) keys of a row family.
fn scale_keys<'a, T: 'a>(
    rows: &'a [T],
    key: impl Fn(&'a T) -> (&'a ResultsVersion, &'a ScaleCode),
) -> BTreeSet<(&'a str, &'a str)> {
    rows.iter()
        .map(key)
        .map(|(v, s)| (v.as_str(), s.as_str()))
        .collect()
}

fn outside_scope(table: &str, scale: &ScaleCode, scope: &ScaleResultScope) -> StorageError {
    StorageError::ConstraintViolation {
        table: table.to_string(),
        message: format!(
            "row for {scale} is outside the write scope of version {}",
            scope.results_version
        ),
    }
}

/// Rejects rows the scope would not delete on the next run.
fn check_scope(batch: &ScaleResultBatch) -> Result<(), StorageError> {
    let scope = &batch.scope;
    if let Some(r) = batch
        .reliability
        .iter()
        .find(|r| !scope.covers_reliability(&r.results_version, &r.cohort))
    {
        return Err(outside_scope("psychometrics_reliability", &r.scale_code, scope));
    }
    if let Some(r) = batch
        .item_stats
        .iter()
        .find(|r| !scope.covers_reliability(&r.results_version, &r.cohort))
    {
        return Err(outside_scope("item_stats", &r.scale_code, scope));
    }
    if let Some(r) = batch
        .loadings
        .iter()
        .find(|r| !scope.covers_loadings(&r.results_version))
    {
        return Err(outside_scope("cfa_loadings", &r.scale_code, scope));
    }
    if let Some(r) = batch
        .fits
        .iter()
        .find(|r| !scope.covers_loadings(&r.results_version))
    {
        return Err(outside_scope("cfa_fit", &r.scale_code, scope));
    }
    Ok(())
}

/// Replace every row `batch.scope` covers with the batch rows.
///
/// An empty batch still clears its scope.
pub fn replace_scale_results(
    conn: &Connection,
    batch: &ScaleResultBatch,
) -> Result<WriteSummary, StorageError> {
    check_scope(batch)?;
    let scope = &batch.scope;
    let version = &scope.results_version;

    let mut parts = Vec::with_capacity(4);
    if let Some(window) = scope.reliability {
        parts.push(replace_reliability(conn, version, window, &batch.reliability)?);
        parts.push(replace_item_stats(conn, version, window, &batch.item_stats)?);
    }
    if scope.loadings {
        parts.push(replace_loadings(conn, version, &batch.loadings)?);
        parts.push(replace_fits(conn, version, &batch.fits)?);
    }
    Ok(parts.iter().fold(WriteSummary::default(), |acc, p| WriteSummary {
        deleted: acc.deleted + p.deleted,
        inserted: acc.inserted + p.inserted,
        ignored: acc.ignored + p.ignored,
    }))
}

fn stored_window(scale: &str, start: &str, end: &str) -> Result<CohortWindow, StorageError> {
    CohortWindow::parse(start, end).map_err(|e| StorageError::SqliteError {
        message: format!("stored cohort window for {scale} is invalid: {e}"),
    })
}

// ─── psychometrics_reliability ─────────────────────────────────────

pub fn replace_reliability(
    conn: &Connection,
    version: &ResultsVersion,
    window: CohortWindow,
    rows: &[ReliabilityResult],
) -> Result<WriteSummary, StorageError> {
    const TABLE: &str = "psychometrics_reliability";
    let mut summary = WriteSummary {
        deleted: conn
            .prepare_cached(
                "DELETE FROM psychometrics_reliability
                 WHERE results_version = ?1 AND cohort_start = ?2 AND cohort_end = ?3",
            )
            .and_then(|mut delete| {
                delete.execute(params![version.as_str(), window.start_key(), window.end_key()])
            })
            .map_err(|e| sqlite_error(TABLE, e))?,
        ..WriteSummary::default()
    };

    let mut insert = conn
        .prepare_cached(
            "INSERT INTO psychometrics_reliability
                 (results_version, scale_code, cohort_start, cohort_end, n_respondents,
                  alpha, omega, sem, split_half_sb, split_half_n, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    for r in rows {
        summary.inserted += insert
            .execute(params![
                r.results_version.as_str(),
                r.scale_code.as_str(),
                r.cohort.start_key(),
                r.cohort.end_key(),
                count_i64(r.n_respondents),
                r.alpha,
                r.omega,
                r.sem,
                r.split_half_sb,
                count_i64(r.split_half_n),
                r.notes,
            ])
            .map_err(|e| sqlite_error(TABLE, e))?;
    }
    Ok(summary)
}

pub fn load_reliability(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<ReliabilityResult>, StorageError> {
    const TABLE: &str = "psychometrics_reliability";
    let mut stmt = conn
        .prepare_cached(
            "SELECT scale_code, cohort_start, cohort_end, n_respondents, alpha, omega, sem,
                    split_half_sb, split_half_n, notes
             FROM psychometrics_reliability
             WHERE results_version = ?1
             ORDER BY scale_code, cohort_start, cohort_end",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;

    let raw = stmt
        .query_map(params![version.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<f64>>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })
        .map_err(|e| sqlite_error(TABLE, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error(TABLE, e))?;

    raw.into_iter()
        .map(|(scale, start, end, n, alpha, omega, sem, sb, sb_n, notes)| {
            let cohort = stored_window(&scale, &start, &end)?;
            Ok(ReliabilityResult {
                scale_code: ScaleCode::new(scale),
                results_version: version.clone(),
                cohort,
                n_respondents: count_usize(n),
                alpha,
                omega,
                sem,
                split_half_sb: sb,
                split_half_n: count_usize(sb_n),
                notes,
            })
        })
        .collect()
}

// ─── cfa_loadings ──────────────────────────────────────────────────

pub fn replace_loadings(
    conn: &Connection,
    version: &ResultsVersion,
    rows: &[LoadingResult],
) -> Result<WriteSummary, StorageError> {
    const TABLE: &str = "cfa_loadings";
    let mut summary = WriteSummary {
        deleted: delete_version(
            conn,
            TABLE,
            "DELETE FROM cfa_loadings WHERE results_version = ?1",
            version,
        )?,
        ..WriteSummary::default()
    };

    let mut insert = conn
        .prepare_cached(
            "INSERT INTO cfa_loadings (results_version, scale_code, question_id, lambda_std, theta)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    for r in rows {
        summary.inserted += insert
            .execute(params![
                r.results_version.as_str(),
                r.scale_code.as_str(),
                r.question_id.get(),
                r.lambda_std,
                r.theta,
            ])
            .map_err(|e| sqlite_error(TABLE, e))?;
    }
    Ok(summary)
}

pub fn load_loadings(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<LoadingResult>, StorageError> {
    const TABLE: &str = "cfa_loadings";
    let mut stmt = conn
        .prepare_cached(
            "SELECT scale_code, question_id, lambda_std, theta
             FROM cfa_loadings
             WHERE results_version = ?1
             ORDER BY scale_code, question_id",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    let rows = stmt
        .query_map(params![version.as_str()], |row| {
            Ok(LoadingResult {
                results_version: version.clone(),
                scale_code: ScaleCode::new(row.get::<_, String>(0)?),
                question_id: QuestionId(row.get(1)?),
                lambda_std: row.get(2)?,
                theta: row.get(3)?,
            })
        })
        .map_err(|e| sqlite_error(TABLE, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error(TABLE, e))
}

// ─── cfa_fit ───────────────────────────────────────────────────────

pub fn replace_fits(
    conn: &Connection,
    version: &ResultsVersion,
    rows: &[CfaFitResult],
) -> Result<WriteSummary, StorageError> {
    const TABLE: &str = "cfa_fit";
    let mut summary = WriteSummary {
        deleted: delete_version(
            conn,
            TABLE,
            "DELETE FROM cfa_fit WHERE results_version = ?1",
            version,
        )?,
        ..WriteSummary::default()
    };

    let mut insert = conn
        .prepare_cached(
            "INSERT INTO cfa_fit
                 (results_version, scale_code, n, chi_square, df, p_value, cfi, tli, rmsea, srmr)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    for r in rows {
        summary.inserted += insert
            .execute(params![
                r.results_version.as_str(),
                r.scale_code.as_str(),
                count_i64(r.n),
                r.chi_square,
                count_i64(r.df),
                r.p_value,
                r.cfi,
                r.tli,
                r.rmsea,
                r.srmr,
            ])
            .map_err(|e| sqlite_error(TABLE, e))?;
    }
    Ok(summary)
}

pub fn load_fits(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<CfaFitResult>, StorageError> {
    const TABLE: &str = "cfa_fit";
    let mut stmt = conn
        .prepare_cached(
            "SELECT scale_code, n, chi_square, df, p_value, cfi, tli, rmsea, srmr
             FROM cfa_fit WHERE results_version = ?1 ORDER BY scale_code",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    let rows = stmt
        .query_map(params![version.as_str()], |row| {
            Ok(CfaFitResult {
                results_version: version.clone(),
                scale_code: ScaleCode::new(row.get::<_, String>(0)?),
                n: count_usize(row.get(1)?),
                chi_square: row.get(2)?,
                df: count_usize(row.get(3)?),
                p_value: row.get(4)?,
                cfi: row.get(5)?,
                tli: row.get(6)?,
                rmsea: row.get(7)?,
                srmr: row.get(8)?,
            })
        })
        .map_err(|e| sqlite_error(TABLE, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error(TABLE, e))
}

// ─── item_stats ────────────────────────────────────────────────────

pub fn replace_item_stats(
    conn: &Connection,
    version: &ResultsVersion,
    window: CohortWindow,
    rows: &[ItemStatResult],
) -> Result<WriteSummary, StorageError> {
    const TABLE: &str = "item_stats";
    let mut summary = WriteSummary {
        deleted: conn
            .prepare_cached(
                "DELETE FROM item_stats
                 WHERE results_version = ?1 AND cohort_start = ?2 AND cohort_end = ?3",
            )
            .and_then(|mut delete| {
                delete.execute(params![version.as_str(), window.start_key(), window.end_key()])
            })
            .map_err(|e| sqlite_error(TABLE, e))?,
        ..WriteSummary::default()
    };

    let mut insert = conn
        .prepare_cached(
            "INSERT INTO item_stats
                 (results_version, scale_code, cohort_start, cohort_end, question_id, r_it, n_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    for r in rows {
        summary.inserted += insert
            .execute(params![
                r.results_version.as_str(),
                r.scale_code.as_str(),
                r.cohort.start_key(),
                r.cohort.end_key(),
                r.question_id.get(),
                r.r_it,
                count_i64(r.n_used),
            ])
            .map_err(|e| sqlite_error(TABLE, e))?;
    }
    Ok(summary)
}

pub fn load_item_stats(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<ItemStatResult>, StorageError> {
    const TABLE: &str = "item_stats";
    let mut stmt = conn
        .prepare_cached(
            "SELECT scale_code, cohort_start, cohort_end, question_id, r_it, n_used
             FROM item_stats WHERE results_version = ?1
             ORDER BY scale_code, cohort_start, cohort_end, question_id",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    let raw = stmt
        .query_map(params![version.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })
        .map_err(|e| sqlite_error(TABLE, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error(TABLE, e))?;

    raw.into_iter()
        .map(|(scale, start, end, question_id, r_it, n_used)| {
            let cohort = stored_window(&scale, &start, &end)?;
            Ok(ItemStatResult {
                results_version: version.clone(),
                scale_code: ScaleCode::new(scale),
                cohort,
                question_id: QuestionId(question_id),
                r_it,
                n_used: count_usize(n_used),
            })
        })
        .collect()
}

fn delete_version(
    conn: &Connection,
    table: &str,
    sql: &str,
    version: &ResultsVersion,
) -> Result<usize, StorageError> {
    conn.prepare_cached(sql)
        .and_then(|mut delete| delete.execute(params![version.as_str()]))
        .map_err(|e| sqlite_error(table, e))
}

fn delete_scale_keys(
    conn: &Connection,
    table: &str,
    sql: &str,
    keys: &BTreeSet<(&str, &str)>,
) -> Result<usize, StorageError> {
    let mut delete = conn.prepare_cached(sql).map_err(|e| sqlite_error(table, e))?;
    let mut deleted = 0;
    for (version, scale) in keys {
        deleted += delete
            .execute(params![version, scale])
            .map_err(|e| sqlite_error(table, e))?;
    }
    Ok(deleted)
}

// ─── retest_pairs ──────────────────────────────────────────────────

/// Write retest rows under `policy`.
///
/// `InsertIfAbsent` keeps any row already stored for a key and counts the
/// new one as ignored. `Replace` first deletes every stored row for each
/// (version, scale) in the batch, so pairs no longer emitted disappear too.
pub fn write_retest_pairs(
    conn: &Connection,
    rows: &[RetestPairResult],
    policy: RetestWritePolicy,
) -> Result<WriteSummary, StorageError> {
    const TABLE: &str = "retest_pairs";
    let mut summary = WriteSummary::default();

    let insert_sql = match policy {
        RetestWritePolicy::InsertIfAbsent => "INSERT OR IGNORE INTO retest_pairs",
        RetestWritePolicy::Replace => {
            summary.deleted = delete_scale_keys(
                conn,
                TABLE,
                "DELETE FROM retest_pairs WHERE results_version = ?1 AND scale_code = ?2",
                &scale_keys(rows, |r| (&r.results_version, &r.scale_code)),
            )?;
            "INSERT INTO retest_pairs"
        }
    };
    let sql = format!(
        "{insert_sql}
             (user_id, scale_code, first_session_id, second_session_id, days_between,
              r_pearson, p_value, n_items_correlated, results_version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    );

    let mut insert = conn.prepare_cached(&sql).map_err(|e| sqlite_error(TABLE, e))?;
    for r in rows {
        let changed = insert
            .execute(params![
                r.user_id.as_str(),
                r.scale_code.as_str(),
                r.first_session_id.as_str(),
                r.second_session_id.as_str(),
                r.days_between,
                r.r_pearson,
                r.p_value,
                count_i64(r.n_items_correlated),
                r.results_version.as_str(),
            ])
            .map_err(|e| sqlite_error(TABLE, e))?;
        if changed == 0 {
            summary.ignored += 1;
        } else {
            summary.inserted += changed;
        }
    }
    Ok(summary)
}

pub fn load_retest_pairs(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<RetestPairResult>, StorageError> {
    const TABLE: &str = "retest_pairs";
    let mut stmt = conn
        .prepare_cached(
            "SELECT user_id, scale_code, first_session_id, second_session_id, days_between,
                    r_pearson, p_value, n_items_correlated
             FROM retest_pairs WHERE results_version = ?1
             ORDER BY user_id, first_session_id, second_session_id",
        )
        .map_err(|e| sqlite_error(TABLE, e))?;
    let rows = stmt
        .query_map(params![version.as_str()], |row| {
            Ok(RetestPairResult {
                user_id: UserId::new(row.get::<_, String>(0)?),
                scale_code: ScaleCode::new(row.get::<_, String>(1)?),
                first_session_id: SessionId::new(row.get::<_, String>(2)?),
                second_session_id: SessionId::new(row.get::<_, String>(3)?),
                days_between: row.get(4)?,
                r_pearson: row.get(5)?,
                p_value: row.get(6)?,
                n_items_correlated: count_usize(row.get(7)?),
                results_version: version.clone(),
            })
        })
        .map_err(|e| sqlite_error(TABLE, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error(TABLE, e))
}

/// Row count of one result table, for reporting and tests.
pub fn count_rows(conn: &Connection, table: ResultTable) -> Result<usize, StorageError> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
        .map(count_usize)
        .map_err(|e| sqlite_error(table.name(), e))
}

/// The result tables written by the jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTable {
    Reliability,
    Loadings,
    Fit,
    ItemStats,
    RetestPairs,
}

impl ResultTable {
    pub fn name(self) -> &'static str {
        match self {
            Self::Reliability => "psychometrics_reliability",
            Self::Loadings => "cfa_loadings",
            Self::Fit => "cfa_fit",
            Self::ItemStats => "item_stats",
            Self::RetestPairs => "retest_pairs",
        }
    }
}
