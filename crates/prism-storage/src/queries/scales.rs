//! scale_items queries.

use prism_core::errors::StorageError;
use prism_core::types::{QuestionId, ScaleCode, ScaleDefinition, ScaleItem};
use rusqlite::{params, Connection};

use super::{count_i64, sqlite_error};

/// Scales with at least `min_items` distinct items, ordered by scale code,
/// items ordered by question id.
pub fn load_scale_definitions(
    conn: &Connection,
    min_items: usize,
) -> Result<Vec<ScaleDefinition>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT scale_code, question_id, weight
             FROM scale_items
             WHERE scale_code IN (
                 SELECT scale_code FROM scale_items
                 GROUP BY scale_code
                 HAVING COUNT(DISTINCT question_id) >= ?1
             )
             ORDER BY scale_code, question_id",
        )
        .map_err(|e| sqlite_error("scale_items", e))?;

    let rows = stmt
        .query_map(params![count_i64(min_items)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(|e| sqlite_error("scale_items", e))?;

    let mut scales: Vec<ScaleDefinition> = Vec::new();
    for row in rows {
        let (code, question_id, weight) = row.map_err(|e| sqlite_error("scale_items", e))?;
        let item = ScaleItem {
            question_id: QuestionId(question_id),
            weight,
        };
        match scales.last_mut() {
            Some(scale) if scale.scale_code.as_str() == code => scale.items.push(item),
            _ => scales.push(ScaleDefinition {
                scale_code: ScaleCode::new(code),
                items: vec![item],
            }),
        }
    }
    Ok(scales)
}
