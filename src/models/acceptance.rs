//! Per-user acceptance record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's acceptance of one agreement version.
///
/// Only one record per `(user_id, agreement_id)` is kept; accepting again
/// replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptanceRecord {
    /// Unique record identifier (UUID v4 prefixed `accept:`).
    pub id: String,
    /// Authenticated user name.
    pub user_id: String,
    /// Accepted agreement.
    pub agreement_id: String,
    /// Agreement version at the time of acceptance.
    pub version: String,
    /// Ids of the consents the user ticked.
    pub consents: Vec<String>,
    /// Acceptance timestamp.
    pub accepted_at: DateTime<Utc>,
}

impl AcceptanceRecord {
    /// Construct a new acceptance record with a generated identifier.
    #[must_use]
    pub fn new(
        user_id: String,
        agreement_id: String,
        version: String,
        consents: Vec<String>,
    ) -> Self {
        Self {
            id: format!("accept:{}", Uuid::new_v4()),
            user_id,
            agreement_id,
            version,
            consents,
            accepted_at: Utc::now(),
        }
    }

    /// Whether this record covers the given agreement version.
    #[must_use]
    pub fn covers(&self, version: &str) -> bool {
        self.version == version
    }
}
