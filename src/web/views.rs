//! View models for agreement pages and their `tera` templates.

use serde::Serialize;
use tera::{Context, Tera};

use crate::models::agreement::{Agreement, Consent};
use crate::Result;

// Embedded so the binary needs no template directory at runtime.
const TPL_BASE: &str = include_str!("templates/base.html");
const TPL_ACCEPT: &str = include_str!("templates/accept_terms_of_service.html");
const TPL_READ_ONLY: &str = include_str!("templates/terms_of_service.html");

/// Which page to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Prompt with the agreement and an accept form.
    AcceptTermsOfService,
    /// Read-only agreement page.
    TermsOfService,
}

impl ViewKind {
    fn template(self) -> &'static str {
        match self {
            Self::AcceptTermsOfService => "accept_terms_of_service.html",
            Self::TermsOfService => "terms_of_service.html",
        }
    }
}

/// Everything a page needs to show one agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgreementView {
    /// Page variant.
    #[serde(skip)]
    pub kind: ViewKind,
    /// Page title (the agreement's full name).
    pub display_name: String,
    /// File-backed agreement body, trusted HTML from the config directory.
    pub agreement_text: Option<String>,
    /// External agreement URL when there is no local text.
    pub agreement_link: Option<String>,
    /// Consents offered on the accept form.
    pub consents: Vec<Consent>,
    /// Form target for [`ViewKind::AcceptTermsOfService`].
    pub action: String,
}

impl AgreementView {
    /// Build the view, reading the agreement text from disk.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Agreement` if the agreement text file cannot be read.
    pub fn build(kind: ViewKind, agreement: &Agreement, action: &str) -> Result<Self> {
        let agreement_text = agreement.text()?;
        Ok(Self {
            kind,
            display_name: agreement.full_name.clone(),
            agreement_link: agreement.link().map(str::to_owned),
            agreement_text,
            consents: agreement.consents.clone(),
            action: action.to_owned(),
        })
    }
}

/// Compiled page templates. Everything except the agreement body is
/// auto-escaped.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` if a template fails to parse.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("base.html", TPL_BASE)?;
        tera.add_raw_template("accept_terms_of_service.html", TPL_ACCEPT)?;
        tera.add_raw_template("terms_of_service.html", TPL_READ_ONLY)?;
        Ok(Self { tera })
    }

    /// Render `view` as a standalone HTML page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` if rendering fails.
    pub fn render(&self, view: &AgreementView) -> Result<String> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(view.kind.template(), &context)?)
    }
}
