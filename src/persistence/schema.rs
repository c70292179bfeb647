//! `SQLite` schema bootstrap logic.
//!
//! All definitions use `IF NOT EXISTS`, so this is safe to re-run on every
//! startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the acceptance table definition to the connected database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS agreement_acceptance (
    id              TEXT PRIMARY KEY NOT NULL,
    user_id         TEXT NOT NULL,
    agreement_id    TEXT NOT NULL,
    version         TEXT NOT NULL,
    consents        TEXT NOT NULL DEFAULT '[]',
    accepted_at     TEXT NOT NULL,
    UNIQUE (user_id, agreement_id)
);

CREATE INDEX IF NOT EXISTS idx_acceptance_user ON agreement_acceptance(user_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
