//! Acceptance record repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::Utc;

use crate::models::acceptance::AcceptanceRecord;
use crate::{AppError, Result};

use super::db::Database;

/// Repository for per-user agreement acceptance records.
#[derive(Clone)]
pub struct AcceptanceRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct AcceptanceRow {
    id: String,
    user_id: String,
    agreement_id: String,
    version: String,
    consents: String,
    accepted_at: String,
}

impl AcceptanceRow {
    fn into_record(self) -> Result<AcceptanceRecord> {
        let consents: Vec<String> = serde_json::from_str(&self.consents)
            .map_err(|e| AppError::Db(format!("invalid consents: {e}")))?;
        let accepted_at = chrono::DateTime::parse_from_rfc3339(&self.accepted_at)
            .map_err(|e| AppError::Db(format!("invalid accepted_at: {e}")))?
            .with_timezone(&Utc);

        Ok(AcceptanceRecord {
            id: self.id,
            user_id: self.user_id,
            agreement_id: self.agreement_id,
            version: self.version,
            consents,
            accepted_at,
        })
    }
}

impl AcceptanceRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store an acceptance, replacing any earlier record for the same
    /// user and agreement.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database write fails.
    pub async fn upsert(&self, record: &AcceptanceRecord) -> Result<AcceptanceRecord> {
        let consents = serde_json::to_string(&record.consents)
            .map_err(|e| AppError::Db(format!("failed to encode consents: {e}")))?;
        let accepted_at = record.accepted_at.to_rfc3339();

        sqlx::query(
            "INSERT INTO agreement_acceptance
                 (id, user_id, agreement_id, version, consents, accepted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, agreement_id) DO UPDATE SET
                 id = excluded.id,
                 version = excluded.version,
                 consents = excluded.consents,
                 accepted_at = excluded.accepted_at",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.agreement_id)
        .bind(&record.version)
        .bind(&consents)
        .bind(&accepted_at)
        .execute(self.db.as_ref())
        .await?;

        Ok(record.clone())
    }

    /// Fetch the acceptance of one agreement by one user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or the row is corrupt.
    pub async fn get(&self, user_id: &str, agreement_id: &str) -> Result<Option<AcceptanceRecord>> {
        let row: Option<AcceptanceRow> = sqlx::query_as(
            "SELECT id, user_id, agreement_id, version, consents, accepted_at
             FROM agreement_acceptance
             WHERE user_id = ?1 AND agreement_id = ?2",
        )
        .bind(user_id)
        .bind(agreement_id)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(AcceptanceRow::into_record).transpose()
    }

    /// Fetch every acceptance recorded for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a row is corrupt.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AcceptanceRecord>> {
        let rows: Vec<AcceptanceRow> = sqlx::query_as(
            "SELECT id, user_id, agreement_id, version, consents, accepted_at
             FROM agreement_acceptance
             WHERE user_id = ?1
             ORDER BY accepted_at ASC",
        )
        .bind(user_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(AcceptanceRow::into_record).collect()
    }
}
