//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Service or agreement configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Agreement text file could not be read at request time.
    Agreement(String),
    /// File watcher could not be created or attached.
    Watch(String),
    /// HTTP server bind or serve failure.
    Http(String),
    /// Page template failed to compile or render.
    Template(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Agreement(msg) => write!(f, "agreement: {msg}"),
            Self::Watch(msg) => write!(f, "watch: {msg}"),
            Self::Http(msg) => write!(f, "http: {msg}"),
            Self::Template(msg) => write!(f, "template: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<quick_xml::DeError> for AppError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Config(format!("malformed agreement config: {err}"))
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        match std::error::Error::source(&err) {
            Some(cause) => Self::Template(format!("{err}: {cause}")),
            None => Self::Template(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}
