//! Agreement config file loader.
//!
//! Parses `terms-of-service-config.xml` into typed [`Agreement`] and
//! [`GuestNotice`] settings. Incomplete entries are dropped silently. Only
//! I/O errors and malformed XML are reported.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::models::agreement::{
    Agreement, AgreementSource, Consent, GuestNotice, DEFAULT_DISPLAY_NAME, DEFAULT_VERSION,
};
use crate::{AppError, Result};

const PARAM_FILE: &str = "agreement-file";
const PARAM_LINK: &str = "agreement-link";
const PARAM_VERSION: &str = "version";
const PARAM_SHORT_NAME: &str = "short-name";
const PARAM_FULL_NAME: &str = "full-name";
const PARAM_FORCE_ACCEPT: &str = "force-accept";
const PARAM_NOTICE_TEXT: &str = "text";
const PARAM_NOTICE_AGREEMENT: &str = "agreement";

/// `<terms-of-service>` document root.
#[derive(Debug, Deserialize)]
struct DocumentXml {
    #[serde(default, rename = "agreement")]
    agreements: Vec<AgreementXml>,
    #[serde(default, rename = "guest-notice")]
    guest_notices: Vec<GuestNoticeXml>,
}

#[derive(Debug, Deserialize)]
struct AgreementXml {
    #[serde(default, rename = "@id")]
    id: Option<String>,
    #[serde(default)]
    parameters: Vec<ParametersXml>,
    #[serde(default)]
    consents: Vec<ConsentsXml>,
}

#[derive(Debug, Deserialize)]
struct GuestNoticeXml {
    #[serde(default)]
    parameters: Vec<ParametersXml>,
}

#[derive(Debug, Default, Deserialize)]
struct ParametersXml {
    #[serde(default)]
    param: Vec<ParamXml>,
}

#[derive(Debug, Deserialize)]
struct ParamXml {
    #[serde(default, rename = "@name")]
    name: Option<String>,
    #[serde(default, rename = "@value")]
    value: Option<String>,
    #[serde(default, rename = "$text")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConsentsXml {
    #[serde(default)]
    consent: Vec<ConsentXml>,
}

#[derive(Debug, Deserialize)]
struct ConsentXml {
    #[serde(default, rename = "@id")]
    id: Option<String>,
    #[serde(default, rename = "@text")]
    text: Option<String>,
    #[serde(default, rename = "@checked")]
    checked: Option<String>,
}

/// Parsed contents of one agreement config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Materialized agreements, in document order.
    pub agreements: Vec<Agreement>,
    /// Guest notice, when complete.
    pub guest_notice: Option<GuestNotice>,
    /// Number of `agreement` elements seen, including skipped ones.
    pub agreement_elements: usize,
}

/// Loads agreement settings from XML.
pub struct AgreementLoader;

impl AgreementLoader {
    /// Read and parse the config file at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist. Agreement text
    /// files are resolved against `store_dir` but not read here.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be read, and
    /// `AppError::Config` if it is not well-formed XML.
    pub fn load(path: &Path, store_dir: &Path) -> Result<Option<LoadedConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Io(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::parse(&raw, store_dir).map(Some)
    }

    /// Parse an agreement config document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `raw` is not well-formed XML.
    pub fn parse(raw: &str, store_dir: &Path) -> Result<LoadedConfig> {
        let document: DocumentXml = quick_xml::de::from_str(raw)?;

        let agreement_elements = document.agreements.len();
        let agreements = document
            .agreements
            .into_iter()
            .filter_map(|el| build_agreement(el, store_dir))
            .collect();

        let guest_notice = document
            .guest_notices
            .into_iter()
            .next()
            .and_then(build_guest_notice);

        Ok(LoadedConfig {
            agreements,
            guest_notice,
            agreement_elements,
        })
    }
}

/// Flatten the first `<parameters>` block into a name → value map.
///
/// Later duplicates override earlier ones. Params without a name are ignored.
fn read_parameters(blocks: Vec<ParametersXml>) -> HashMap<String, String> {
    blocks
        .into_iter()
        .next()
        .unwrap_or_default()
        .param
        .into_iter()
        .filter_map(|p| {
            let name = p.name?;
            let value = p.value.or(p.text).unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn build_agreement(el: AgreementXml, store_dir: &Path) -> Option<Agreement> {
    let mut params = read_parameters(el.parameters);

    let file = params.remove(PARAM_FILE);
    let link = params.remove(PARAM_LINK);
    let source = match (file, link) {
        (Some(file), None) => AgreementSource::File(store_dir.join(file)),
        (Some(file), Some(link)) => AgreementSource::FileWithLink(store_dir.join(file), link),
        (None, Some(link)) => AgreementSource::Link(link),
        (None, None) => return None,
    };

    let consents = el
        .consents
        .into_iter()
        .next()
        .unwrap_or_default()
        .consent
        .into_iter()
        .filter_map(build_consent)
        .collect();

    Some(Agreement {
        id: el.id.unwrap_or_default(),
        version: params
            .remove(PARAM_VERSION)
            .unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
        short_name: params
            .remove(PARAM_SHORT_NAME)
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned()),
        full_name: params
            .remove(PARAM_FULL_NAME)
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned()),
        source,
        force_accept: params
            .get(PARAM_FORCE_ACCEPT)
            .map(String::as_str)
            .is_none_or(parse_bool),
        consents,
    })
}

fn build_consent(el: ConsentXml) -> Option<Consent> {
    let id = el.id.filter(|s| !s.is_empty())?;
    let text = el.text.filter(|s| !s.is_empty())?;
    Some(Consent {
        id,
        text,
        checked_by_default: el.checked.as_deref().is_some_and(parse_bool),
    })
}

fn build_guest_notice(el: GuestNoticeXml) -> Option<GuestNotice> {
    let mut params = read_parameters(el.parameters);
    let text = params.remove(PARAM_NOTICE_TEXT)?;
    let agreement_id = params.remove(PARAM_NOTICE_AGREEMENT)?;
    Some(GuestNotice { text, agreement_id })
}

/// `true` only for a case-insensitive `"true"`, without trimming; anything
/// else is `false`.
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
