//! Per-user acceptance evaluation.
//!
//! Combines the live [`AgreementStore`] snapshot with the user's stored
//! [`AcceptanceRecord`]s. Acceptance is version-bound: bumping an
//! agreement's `version` puts every user back into
//! [`AcceptanceState::PendingAcceptance`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::models::acceptance::AcceptanceRecord;
use crate::models::agreement::Agreement;
use crate::persistence::acceptance_repo::AcceptanceRepo;
use crate::store::AgreementStore;
use crate::Result;

/// Where a user stands with respect to the configured agreements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceState {
    /// Nothing to accept and nothing accepted.
    NotRequired,
    /// A forced agreement has not been accepted at its current version.
    PendingAcceptance(Agreement),
    /// Every forced agreement is accepted; carries the first accepted one.
    Accepted(Agreement),
}

impl AcceptanceState {
    /// Agreement the state refers to, if any.
    #[must_use]
    pub fn agreement(&self) -> Option<&Agreement> {
        match self {
            Self::NotRequired => None,
            Self::PendingAcceptance(a) | Self::Accepted(a) => Some(a),
        }
    }

    /// Whether the user has to go through the acceptance page.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingAcceptance(_))
    }
}

/// Decide the state from agreements in config order and the user's records.
///
/// Only the first agreement with a given id counts; later duplicates are
/// shadowed, as in [`AgreementStore::agreement`].
#[must_use]
pub fn evaluate(agreements: &[Agreement], records: &[AcceptanceRecord]) -> AcceptanceState {
    let by_agreement: HashMap<&str, &AcceptanceRecord> = records
        .iter()
        .map(|r| (r.agreement_id.as_str(), r))
        .collect();
    let accepted = |a: &Agreement| {
        by_agreement
            .get(a.id.as_str())
            .is_some_and(|r| r.covers(&a.version))
    };

    let mut seen = HashSet::new();
    let effective: Vec<&Agreement> = agreements
        .iter()
        .filter(|a| seen.insert(a.id.as_str()))
        .collect();

    if let Some(pending) = effective
        .iter()
        .copied()
        .find(|&a| a.force_accept && !accepted(a))
    {
        return AcceptanceState::PendingAcceptance(pending.clone());
    }
    effective
        .into_iter()
        .find(|&a| accepted(a))
        .map_or(AcceptanceState::NotRequired, |a| {
            AcceptanceState::Accepted(a.clone())
        })
}

/// Answers acceptance questions for the request handler and the gate.
#[derive(Clone)]
pub struct AcceptancePolicy {
    store: Arc<AgreementStore>,
    repo: AcceptanceRepo,
}

impl AcceptancePolicy {
    /// Create a policy over a store and an acceptance repository.
    #[must_use]
    pub fn new(store: Arc<AgreementStore>, repo: AcceptanceRepo) -> Self {
        Self { store, repo }
    }

    /// Agreement configuration this policy reads.
    #[must_use]
    pub fn store(&self) -> &Arc<AgreementStore> {
        &self.store
    }

    /// Current state for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the user's records cannot be read.
    pub async fn state(&self, user: &str) -> Result<AcceptanceState> {
        let snapshot = self.store.snapshot();
        if snapshot.agreements.is_empty() {
            return Ok(AcceptanceState::NotRequired);
        }
        let records = self.repo.list_for_user(user).await?;
        Ok(evaluate(&snapshot.agreements, &records))
    }

    /// Whether `user` is subject to any agreement at all.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the user's records cannot be read.
    pub async fn should_accept(&self, user: &str) -> Result<bool> {
        Ok(self.state(user).await? != AcceptanceState::NotRequired)
    }

    /// Record that `user` accepted the current version of `agreement`.
    ///
    /// Consent ids not defined on the agreement are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the record cannot be written.
    pub async fn accept(
        &self,
        user: &str,
        agreement: &Agreement,
        consents: &[String],
    ) -> Result<AcceptanceRecord> {
        let granted: Vec<String> = consents
            .iter()
            .filter(|id| agreement.consent(id).is_some())
            .cloned()
            .collect();
        let record = AcceptanceRecord::new(
            user.to_owned(),
            agreement.id.clone(),
            agreement.version.clone(),
            granted,
        );
        let saved = self.repo.upsert(&record).await?;
        info!(
            user,
            agreement = %agreement.id,
            version = %agreement.version,
            consents = saved.consents.len(),
            "agreement accepted"
        );
        Ok(saved)
    }
}
