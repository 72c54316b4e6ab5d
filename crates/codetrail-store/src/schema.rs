//! Activity store database schema.

use sqlx::PgPool;

/// SQL to create the activities table and its secondary indexes.
///
/// Kept in sync with `migrations/0001_create_activities.sql`.
pub const CREATE_ACTIVITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
    id          BIGSERIAL PRIMARY KEY,
    kind        SMALLINT NOT NULL,
    "time"      BIGINT NOT NULL CHECK ("time" > 0),
    duration    BIGINT NOT NULL CHECK (duration >= 0),
    language    TEXT NOT NULL DEFAULT '',
    file        TEXT NOT NULL DEFAULT '',
    project     TEXT NOT NULL DEFAULT '',
    computer_id TEXT NOT NULL DEFAULT '',
    vcs_type    TEXT NOT NULL DEFAULT '',
    vcs_repo    TEXT NOT NULL DEFAULT '',
    vcs_branch  TEXT NOT NULL DEFAULT '',
    line        INTEGER NOT NULL DEFAULT 0,
    "char"      INTEGER NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_activities_time ON activities ("time");
CREATE INDEX IF NOT EXISTS idx_activities_project ON activities (project);
CREATE INDEX IF NOT EXISTS idx_activities_language ON activities (language);
CREATE INDEX IF NOT EXISTS idx_activities_computer_id ON activities (computer_id);
CREATE INDEX IF NOT EXISTS idx_activities_created_at ON activities (created_at);
"#;

/// Creates the table and indexes if they do not exist yet.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_ACTIVITIES_TABLE).execute(pool).await?;
    Ok(())
}
