//! retest_candidates queries.

use prism_core::errors::StorageError;
use prism_core::types::{ResultsVersion, RetestCandidate, SessionId, UserId};
use rusqlite::{params, Connection};

use super::sqlite_error;

/// Candidate pairs for one results version, ordered by user then sessions.
pub fn load_retest_candidates(
    conn: &Connection,
    version: &ResultsVersion,
) -> Result<Vec<RetestCandidate>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT user_id, first_session_id, second_session_id, results_version, days_between
             FROM retest_candidates
             WHERE results_version = ?1
             ORDER BY user_id, first_session_id, second_session_id",
        )
        .map_err(|e| sqlite_error("retest_candidates", e))?;

    let rows = stmt
        .query_map(params![version.as_str()], |row| {
            Ok(RetestCandidate {
                user_id: UserId::new(row.get::<_, String>(0)?),
                first_session_id: SessionId::new(row.get::<_, String>(1)?),
                second_session_id: SessionId::new(row.get::<_, String>(2)?),
                results_version: ResultsVersion::new(row.get::<_, String>(3)?),
                days_between: row.get(4)?,
            })
        })
        .map_err(|e| sqlite_error("retest_candidates", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlite_error("retest_candidates", e))
}
