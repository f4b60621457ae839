//! Inserts into the source tables. The jobs never write here; these feed
//! imports and test fixtures.

use prism_core::errors::StorageError;
use prism_core::types::RetestCandidate;
use rusqlite::{params, Connection};

use super::sqlite_error;

pub fn insert_scale_item(
    conn: &Connection,
    scale_code: &str,
    question_id: i64,
    weight: f64,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO scale_items (scale_code, question_id, weight) VALUES (?1, ?2, ?3)",
    )
    .and_then(|mut stmt| stmt.execute(params![scale_code, question_id, weight]))
    .map(|_| ())
    .map_err(|e| sqlite_error("scale_items", e))
}

pub fn insert_session(
    conn: &Connection,
    id: &str,
    user_id: &str,
    status: &str,
    completed_at: Option<&str>,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO assessment_sessions (id, user_id, status, completed_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .and_then(|mut stmt| stmt.execute(params![id, user_id, status, completed_at]))
    .map(|_| ())
    .map_err(|e| sqlite_error("assessment_sessions", e))
}

pub fn insert_response(
    conn: &Connection,
    session_id: &str,
    question_id: i64,
    answer: Option<f64>,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO assessment_responses (session_id, question_id, answer_numeric)
         VALUES (?1, ?2, ?3)",
    )
    .and_then(|mut stmt| stmt.execute(params![session_id, question_id, answer]))
    .map(|_| ())
    .map_err(|e| sqlite_error("assessment_responses", e))
}

pub fn insert_retest_candidate(
    conn: &Connection,
    candidate: &RetestCandidate,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO retest_candidates
             (user_id, first_session_id, second_session_id, results_version, days_between)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            candidate.user_id.as_str(),
            candidate.first_session_id.as_str(),
            candidate.second_session_id.as_str(),
            candidate.results_version.as_str(),
            candidate.days_between,
        ])
    })
    .map(|_| ())
    .map_err(|e| sqlite_error("retest_candidates", e))
}
