//! End-to-end runs against an in-memory SQLite store.

use prism_core::config::{RunSettings, Thresholds};
use prism_core::errors::{ConfigError, JobError, StorageError};
use prism_core::types::{CohortWindow, ResultsVersion, RetestCandidate, SessionId, UserId};
use prism_jobs::{JobKind, Orchestrator, Outcome, RunSummary};
use prism_storage::queries::results::{self, count_rows, ResultTable};
use prism_storage::queries::source;
use prism_storage::SqliteStore;

/// Deterministic noise in [-0.5, 0.5).
fn jitter(s: u64, q: u64) -> f64 {
    let mut x = s
        .wrapping_mul(6364136223846793005)
        .wrapping_add(q.wrapping_mul(1442695040888963407));
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    (x % 1000) as f64 / 1000.0 - 0.5
}

/// Scales and respondents:
///   EXT   items 1-4,  60 respondents completed in January
///   SMALL items 5-9,  49 respondents completed in January
///   PAIR  items 10-11, 55 respondents completed in January
/// Retest users r1 (all items, both sessions) and r2 (second session covers
/// EXT only) complete their sessions in March.
fn setup_db() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    let scales: [(&str, std::ops::RangeInclusive<i64>, u64); 3] =
        [("EXT", 1..=4, 60), ("SMALL", 5..=9, 49), ("PAIR", 10..=11, 55)];

    store
        .db()
        .with_writer(|conn| {
            for (code, items, n) in &scales {
                for q in items.clone() {
                    source::insert_scale_item(conn, code, q, 1.0)?;
                }
                for s in 0..*n {
                    let session = format!("{code}-{s:03}");
                    source::insert_session(conn, &session, &session, "completed", Some("2025-01-15"))?;
                    let truth = ((s * 37) % 11) as f64 / 2.0 + 1.0;
                    for q in items.clone() {
                        let value = truth + 0.6 * jitter(s, q as u64);
                        source::insert_response(conn, &session, q, Some(value))?;
                    }
                }
            }

            let retest_sessions: [(&str, &str, f64, i64); 4] = [
                ("r1a", "r1", 3.0, 11),
                ("r1b", "r1", 4.0, 11),
                ("r2a", "r2", 3.0, 11),
                ("r2b", "r2", 4.0, 4),
            ];
            for (session, user, value, last_item) in retest_sessions {
                source::insert_session(conn, session, user, "completed", Some("2025-03-10"))?;
                for q in 1..=last_item {
                    source::insert_response(conn, session, q, Some(value + q as f64 / 10.0))?;
                }
            }
            for (user, first, second) in [("r1", "r1a", "r1b"), ("r2", "r2a", "r2b")] {
                source::insert_retest_candidate(
                    conn,
                    &RetestCandidate {
                        user_id: UserId::from(user),
                        first_session_id: SessionId::from(first),
                        second_session_id: SessionId::from(second),
                        results_version: ResultsVersion::from("v1"),
                        days_between: 30,
                    },
                )?;
            }
            Ok(())
        })
        .unwrap();
    store
}

fn settings() -> RunSettings {
    RunSettings::new("v1").with_cohort(CohortWindow::parse("2025-01-01", "2025-02-01").unwrap())
}

fn outcome_of<'a>(summary: &'a RunSummary, unit: &str) -> &'a Outcome {
    &summary
        .units
        .iter()
        .find(|u| u.unit == unit)
        .unwrap_or_else(|| panic!("no unit {unit}"))
        .outcome
}

#[test]
fn test_reliability_skips_scale_below_minimum_sample() {
    let store = setup_db();
    let summary = Orchestrator::new(&store, settings())
        .run(JobKind::Reliability)
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errored, 0);
    assert_eq!(*outcome_of(&summary, "reliability/SMALL"), Outcome::Skipped);
    assert_eq!(summary.exit_code(), 0);

    let version = ResultsVersion::from("v1");
    let rows = store
        .db()
        .with_reader(|conn| results::load_reliability(conn, &version))
        .unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r.scale_code.as_str()).collect();
    assert_eq!(codes, vec!["EXT", "PAIR"]);
    let ext = &rows[0];
    assert_eq!(ext.n_respondents, 60);
    assert!(ext.alpha.unwrap() > 0.9);
    assert_eq!(ext.cohort.start_key(), "2025-01-01");

    let item_stats = store
        .db()
        .with_reader(|conn| count_rows(conn, ResultTable::ItemStats))
        .unwrap();
    assert_eq!(item_stats, 6);
}

#[test]
fn test_rerun_drops_rows_of_newly_skipped_scale() {
    let store = setup_db();
    let orchestrator = Orchestrator::new(&store, settings());
    let version = ResultsVersion::from("v1");
    orchestrator.run(JobKind::Reliability).unwrap();

    // 20 EXT respondents lose item 1, leaving 40 complete cases.
    store
        .db()
        .with_writer(|conn| {
            conn.execute(
                "UPDATE assessment_responses SET answer_numeric = NULL
                 WHERE question_id = 1 AND session_id IN (
                     SELECT id FROM assessment_sessions
                     WHERE id LIKE 'EXT-%' ORDER BY id LIMIT 20)",
                [],
            )
            .map_err(|e| StorageError::SqliteError {
                message: e.to_string(),
            })
        })
        .unwrap();

    let second = orchestrator.run(JobKind::Reliability).unwrap();
    assert_eq!(*outcome_of(&second, "reliability/EXT"), Outcome::Skipped);
    assert_eq!(*outcome_of(&second, "reliability/PAIR"), Outcome::Succeeded);

    let rows = store
        .db()
        .with_reader(|conn| results::load_reliability(conn, &version))
        .unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r.scale_code.as_str()).collect();
    assert_eq!(codes, vec!["PAIR"]);
    let stats = store
        .db()
        .with_reader(|conn| results::load_item_stats(conn, &version))
        .unwrap();
    assert!(stats.iter().all(|r| r.scale_code.as_str() == "PAIR"));
    assert_eq!(stats.len(), 2);
}

#[test]
fn test_rerun_with_every_scale_skipped_clears_window() {
    let store = setup_db();
    let first = Orchestrator::new(&store, settings())
        .run(JobKind::Reliability)
        .unwrap();
    assert_eq!(first.succeeded, 2);

    let strict = settings().with_thresholds(Thresholds {
        min_sample_size: 1000,
        ..Thresholds::default()
    });
    let summary = Orchestrator::new(&store, strict)
        .run(JobKind::Reliability)
        .unwrap();
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.rows_written, 0);

    for table in [ResultTable::Reliability, ResultTable::ItemStats] {
        let count = store
            .db()
            .with_reader(|conn| count_rows(conn, table))
            .unwrap();
        assert_eq!(count, 0, "{} still holds rows", table.name());
    }
}

#[test]
fn test_reliability_requires_cohort_window() {
    let store = setup_db();
    let err = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Reliability)
        .unwrap_err();
    assert!(matches!(err, JobError::Config(ConfigError::MissingField { .. })));
    assert!(err.is_fatal());
}

#[test]
fn test_loadings_skip_two_item_scale() {
    let store = setup_db();
    let summary = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Loadings)
        .unwrap();

    assert_eq!(*outcome_of(&summary, "loadings/PAIR"), Outcome::Skipped);
    assert_eq!(*outcome_of(&summary, "loadings/EXT"), Outcome::Succeeded);

    let version = ResultsVersion::from("v1");
    let loadings = store
        .db()
        .with_reader(|conn| results::load_loadings(conn, &version))
        .unwrap();
    let ext: Vec<_> = loadings.iter().filter(|l| l.scale_code.as_str() == "EXT").collect();
    assert_eq!(ext.len(), 4);
    for l in &loadings {
        assert!((l.theta + l.lambda_std * l.lambda_std - 1.0).abs() < 1e-12);
    }
    let fits = store
        .db()
        .with_reader(|conn| results::load_fits(conn, &version))
        .unwrap();
    assert!(fits.iter().any(|f| f.scale_code.as_str() == "EXT" && f.df == 2));
}

#[test]
fn test_retest_pairs() {
    let store = setup_db();
    let summary = Orchestrator::new(&store, RunSettings::new("v1"))
        .run(JobKind::Retest)
        .unwrap();

    assert_eq!(*outcome_of(&summary, "retest/r1:r1a:r1b"), Outcome::Succeeded);
    assert_eq!(*outcome_of(&summary, "retest/r2:r2a:r2b"), Outcome::Skipped);
    assert_eq!(summary.rows_written, 1);

    let pairs = store
        .db()
        .with_reader(|conn| results::load_retest_pairs(conn, &ResultsVersion::from("v1")))
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].scale_code.as_str(), "ALL_SCALES");
    assert_eq!(pairs[0].n_items_correlated, 3);
    assert_eq!(pairs[0].days_between, 30);
}

#[test]
fn test_retest_rerun_keeps_existing_rows() {
    let store = setup_db();
    let orchestrator = Orchestrator::new(&store, RunSettings::new("v1"));
    orchestrator.run(JobKind::Retest).unwrap();
    let second = orchestrator.run(JobKind::Retest).unwrap();
    assert_eq!(second.rows_written, 0);
    assert_eq!(second.succeeded, 1);

    let count = store
        .db()
        .with_reader(|conn| count_rows(conn, ResultTable::RetestPairs))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_all_is_idempotent() {
    let store = setup_db();
    let orchestrator = Orchestrator::new(&store, settings());
    let version = ResultsVersion::from("v1");

    let snapshot = |store: &SqliteStore| {
        store
            .db()
            .with_reader(|conn| {
                Ok((
                    results::load_reliability(conn, &version)?,
                    results::load_loadings(conn, &version)?,
                    results::load_fits(conn, &version)?,
                    results::load_item_stats(conn, &version)?,
                    results::load_retest_pairs(conn, &version)?,
                ))
            })
            .unwrap()
    };

    let first = orchestrator.run(JobKind::All).unwrap();
    let after_first = snapshot(&store);
    let second = orchestrator.run(JobKind::All).unwrap();
    let after_second = snapshot(&store);

    assert_eq!(after_first, after_second);
    assert_eq!(first.succeeded, second.succeeded);
    assert_eq!(first.skipped, second.skipped);
    assert!(first.rows_written > 0);
}
