//! assessment_responses queries.
//!
//! Only sessions with status `completed` are read. Item and session lists
//! are bound as expanded `IN (...)` parameters.

use prism_core::constants::COMPLETED_STATUS;
use prism_core::errors::StorageError;
use prism_core::traits::ResponseFilter;
use prism_core::types::{QuestionId, ResponseRecord, SessionId};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::{count_i64, int_values, placeholders, sqlite_error, MAX_BOUND_PARAMS};

/// Responses to `item_ids` from completed sessions, restricted by `filter`.
///
/// The cohort window compares the calendar date of `completed_at` against
/// `[start, end)`. With `complete_coverage`, only sessions holding a non-null
/// answer for every requested item are returned.
pub fn load_responses(
    conn: &Connection,
    item_ids: &[QuestionId],
    filter: &ResponseFilter,
) -> Result<Vec<ResponseRecord>, StorageError> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<i64> = item_ids.iter().map(|q| q.get()).collect();
    ids.sort_unstable();
    ids.dedup();

    let in_items = placeholders(ids.len());
    let mut sql = format!(
        "SELECT r.session_id, r.question_id, r.answer_numeric
         FROM assessment_responses r
         JOIN assessment_sessions s ON s.id = r.session_id
         WHERE s.status = ? AND r.question_id IN ({in_items})"
    );
    let mut values = vec![Value::Text(COMPLETED_STATUS.to_string())];
    values.extend(int_values(ids.iter().copied()));

    if let Some(window) = filter.cohort {
        sql.push_str(" AND date(s.completed_at) >= ? AND date(s.completed_at) < ?");
        values.push(Value::Text(window.start_key()));
        values.push(Value::Text(window.end_key()));
    }
    if filter.complete_coverage {
        sql.push_str(&format!(
            " AND r.session_id IN (
                 SELECT session_id FROM assessment_responses
                 WHERE question_id IN ({in_items}) AND answer_numeric IS NOT NULL
                 GROUP BY session_id
                 HAVING COUNT(DISTINCT question_id) = ?
             )"
        ));
        values.extend(int_values(ids.iter().copied()));
        values.push(Value::Integer(count_i64(ids.len())));
    }
    sql.push_str(" ORDER BY r.session_id, r.question_id");

    query_records(conn, &sql, values)
}

/// Responses to `item_ids` from the listed sessions, in session order.
pub fn load_session_responses(
    conn: &Connection,
    session_ids: &[SessionId],
    item_ids: &[QuestionId],
) -> Result<Vec<ResponseRecord>, StorageError> {
    if session_ids.is_empty() || item_ids.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<i64> = item_ids.iter().map(|q| q.get()).collect();
    let chunk_size = MAX_BOUND_PARAMS.saturating_sub(items.len()).max(1);

    let mut out = Vec::new();
    for chunk in session_ids.chunks(chunk_size) {
        let sql = format!(
            "SELECT session_id, question_id, answer_numeric
             FROM assessment_responses
             WHERE session_id IN ({}) AND question_id IN ({})
             ORDER BY session_id, question_id",
            placeholders(chunk.len()),
            placeholders(items.len()),
        );
        let mut values: Vec<Value> = chunk
            .iter()
            .map(|s| Value::Text(s.as_str().to_string()))
            .collect();
        values.extend(int_values(items.iter().copied()));
        out.extend(query_records(conn, &sql, values)?);
    }
    Ok(out)
}

fn query_records(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> Result<Vec<ResponseRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| sqlite_error("assessment_responses", e))?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(ResponseRecord::new(
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })
        .map_err(|e| sqlite_error("assessment_responses", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error("assessment_responses", e))
}
