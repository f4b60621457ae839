//! V001: source tables read by the jobs: scale items, sessions, responses and
//! retest candidates.

pub const MIGRATION_SQL: &str = r#"
-- Scale membership. Negative weights mark reverse-keyed items.
CREATE TABLE IF NOT EXISTS scale_items (
    scale_code TEXT NOT NULL,
    question_id INTEGER NOT NULL,
    weight REAL NOT NULL DEFAULT 1.0,
    PRIMARY KEY (scale_code, question_id)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_scale_items_question ON scale_items(question_id);

-- Assessment sessions. completed_at is an ISO-8601 date or datetime.
CREATE TABLE IF NOT EXISTS assessment_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL,
    completed_at TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_sessions_status_completed
    ON assessment_sessions(status, completed_at);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON assessment_sessions(user_id);

-- One row per answered (or skipped) item.
CREATE TABLE IF NOT EXISTS assessment_responses (
    session_id TEXT NOT NULL REFERENCES assessment_sessions(id),
    question_id INTEGER NOT NULL,
    answer_numeric REAL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_responses_question ON assessment_responses(question_id, session_id);
CREATE INDEX IF NOT EXISTS idx_responses_session ON assessment_responses(session_id);

-- Session pairs eligible for test-retest analysis, per results version.
CREATE TABLE IF NOT EXISTS retest_candidates (
    user_id TEXT NOT NULL,
    first_session_id TEXT NOT NULL,
    second_session_id TEXT NOT NULL,
    results_version TEXT NOT NULL,
    days_between INTEGER NOT NULL,
    PRIMARY KEY (user_id, first_session_id, second_session_id, results_version)
) STRICT;
"#;
