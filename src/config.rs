//! Service configuration parsing and validation.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Directory under `config_dir` holding the agreement config and text files.
pub const STORE_DIR: &str = "termsOfService";

/// Agreement configuration file name inside [`STORE_DIR`].
pub const CONFIG_FILE: &str = "terms-of-service-config.xml";

const DATABASE_FILE: &str = "acceptance.db";

fn default_http_port() -> u16 {
    3000
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_entry_path() -> String {
    "/termsOfService.html".into()
}

fn default_landing_path() -> String {
    "/overview.html".into()
}

fn default_user_header() -> String {
    "x-remote-user".into()
}

fn default_watch_interval_ms() -> u64 {
    10_000
}

/// Global configuration parsed from the service TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Product configuration directory; agreements live in its `termsOfService` child.
    pub config_dir: PathBuf,
    /// HTTP listen port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// HTTP listen address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// Deployment prefix prepended to every route and redirect.
    #[serde(default)]
    pub context_path: String,
    /// Path of the acceptance endpoint, relative to `context_path`.
    #[serde(default = "default_entry_path")]
    pub entry_path: String,
    /// Default redirect target after acceptance, relative to `context_path`.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// Request header carrying the authenticated user name.
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// Poll interval for the agreement config watcher.
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
    /// `SQLite` file for acceptance records.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding the agreement config file and agreement texts.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.config_dir.join(STORE_DIR)
    }

    /// Full path of the watched agreement config file.
    #[must_use]
    pub fn agreements_file(&self) -> PathBuf {
        self.store_dir().join(CONFIG_FILE)
    }

    /// Acceptance database location, defaulting into the store directory.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.store_dir().join(DATABASE_FILE))
    }

    /// Poll interval for the config watcher.
    #[must_use]
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    /// Absolute route of the acceptance endpoint.
    #[must_use]
    pub fn entry_point(&self) -> String {
        format!("{}{}", self.context_path, self.entry_path)
    }

    /// Absolute URL of the default landing page.
    #[must_use]
    pub fn landing_url(&self) -> String {
        format!("{}{}", self.context_path, self.landing_path)
    }

    /// Replace the product config directory, re-validating it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the directory does not exist.
    pub fn set_config_dir(&mut self, dir: &Path) -> Result<()> {
        self.config_dir = dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("config_dir invalid: {err}")))?;
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.watch_interval_ms == 0 {
            return Err(AppError::Config(
                "watch_interval_ms must be greater than zero".into(),
            ));
        }

        if self.user_header.trim().is_empty() {
            return Err(AppError::Config("user_header must not be empty".into()));
        }

        for (name, value) in [
            ("entry_path", &self.entry_path),
            ("landing_path", &self.landing_path),
        ] {
            if !value.starts_with('/') {
                return Err(AppError::Config(format!("{name} must start with '/'")));
            }
        }

        let context = self.context_path.trim_end_matches('/').to_owned();
        if !context.is_empty() && !context.starts_with('/') {
            return Err(AppError::Config(
                "context_path must be empty or start with '/'".into(),
            ));
        }
        self.context_path = context;

        let config_dir = self.config_dir.clone();
        self.set_config_dir(&config_dir)
    }
}
