//! Agreement, consent, and guest notice settings.
//!
//! These are typed, already-defaulted views of the XML parameters. They are
//! built once per reload by [`crate::store::loader`] and never mutated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{AppError, Result};

/// Default value of [`Agreement::version`].
pub const DEFAULT_VERSION: &str = "1";

/// Default value of both display names.
pub const DEFAULT_DISPLAY_NAME: &str = "Terms of Service";

/// A single checkbox-style sub-clause within an agreement.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Consent {
    /// Stable consent identifier, submitted back on acceptance.
    pub id: String,
    /// Label shown next to the checkbox.
    pub text: String,
    /// Whether the checkbox starts ticked.
    pub checked_by_default: bool,
}

/// Where the agreement body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgreementSource {
    /// HTML/text file resolved against the store directory.
    File(PathBuf),
    /// File reference plus a link that is shadowed by it.
    FileWithLink(PathBuf, String),
    /// External URL; no local text.
    Link(String),
}

/// A single terms-of-service document a user may need to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agreement {
    /// Unique key (duplicates resolve first-match).
    pub id: String,
    /// Acceptance is tied to this exact version string.
    pub version: String,
    /// Short display name.
    pub short_name: String,
    /// Full display name used as the page title.
    pub full_name: String,
    /// Body source.
    pub source: AgreementSource,
    /// Whether users are forced to accept before using the product.
    pub force_accept: bool,
    /// Sub-clauses, in document order.
    pub consents: Vec<Consent>,
}

impl Agreement {
    /// Read the agreement text from its file.
    ///
    /// Returns `Ok(None)` for link-only agreements. The file is re-read on
    /// every call so edits to the text show up without a config reload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Agreement` when the referenced file is missing,
    /// unreadable, or not valid UTF-8.
    pub fn text(&self) -> Result<Option<String>> {
        let Some(path) = self.text_file() else {
            return Ok(None);
        };
        fs::read_to_string(path).map(Some).map_err(|err| {
            warn!(
                agreement = %self.id,
                path = %path.display(),
                %err,
                "error while reading agreement file"
            );
            AppError::Agreement(format!(
                "error while reading agreement file {}: {err}",
                path.display()
            ))
        })
    }

    /// External link, present only when there is no file-backed text.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        match &self.source {
            AgreementSource::Link(link) => Some(link),
            AgreementSource::File(_) | AgreementSource::FileWithLink(..) => None,
        }
    }

    /// Resolved path of the text file, if any.
    #[must_use]
    pub fn text_file(&self) -> Option<&Path> {
        match &self.source {
            AgreementSource::File(path) | AgreementSource::FileWithLink(path, _) => Some(path),
            AgreementSource::Link(_) => None,
        }
    }

    /// Look up a consent by id.
    #[must_use]
    pub fn consent(&self, id: &str) -> Option<&Consent> {
        self.consents.iter().find(|c| c.id == id)
    }
}

/// Notice shown to anonymous users, pointing at one agreement.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GuestNotice {
    /// Notice body.
    pub text: String,
    /// Referenced [`Agreement::id`]; not checked against the agreement list.
    pub agreement_id: String,
}

/// Complete, atomically replaced agreement configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Agreements in document order.
    pub agreements: Vec<Agreement>,
    /// Optional guest notice.
    pub guest_notice: Option<GuestNotice>,
    /// Number of successful reloads that produced this snapshot.
    pub generation: u64,
}

impl ConfigSnapshot {
    /// First agreement with the given id.
    #[must_use]
    pub fn agreement(&self, id: &str) -> Option<&Agreement> {
        self.agreements.iter().find(|a| a.id == id)
    }
}

/// Shared handle to an immutable snapshot.
pub type SharedSnapshot = Arc<ConfigSnapshot>;
