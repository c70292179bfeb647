//! Hot-reload watcher for the agreement config file.
//!
//! [`AgreementWatcher`] polls the store directory with a `notify`
//! [`PollWatcher`] and calls [`AgreementStore::reload`] whenever the config
//! file is created, modified, or removed. Changes to agreement text files
//! in the same directory are ignored: texts are read per request anyway.
//!
//! ## Thread safety
//!
//! The callback runs on the poll thread and only touches the store through
//! its own lock, so no async context is needed.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::config::CONFIG_FILE;
use crate::store::agreement_store::AgreementStore;
use crate::{AppError, Result};

/// Returns `true` for create/modify/remove events touching the config file.
fn is_config_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == CONFIG_FILE))
}

/// Polls the agreement config and reloads the store on change.
///
/// Dropping the watcher stops polling, so callers must keep it alive for
/// as long as hot-reload is wanted.
pub struct AgreementWatcher {
    _watcher: PollWatcher,
    store: Arc<AgreementStore>,
}

impl AgreementWatcher {
    /// Load the store once and start polling its directory every `interval`.
    ///
    /// The store directory is created when missing so the watch has
    /// something to attach to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Watch` if the directory cannot be created or the
    /// poll watcher cannot be attached to it.
    pub fn start(store: Arc<AgreementStore>, interval: Duration) -> Result<Self> {
        let dir = store.store_dir().to_owned();
        fs::create_dir_all(&dir).map_err(|err| {
            AppError::Watch(format!("failed to create {}: {err}", dir.display()))
        })?;

        store.reload();

        let store_for_callback = Arc::clone(&store);
        let mut watcher = PollWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) if is_config_change(&event) => store_for_callback.reload(),
                Err(err) => {
                    warn!(%err, "agreement config watcher error");
                }
                _ => {}
            },
            notify::Config::default().with_poll_interval(interval),
        )
        .map_err(|err| AppError::Watch(format!("failed to create config watcher: {err}")))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::Watch(format!("failed to watch '{}': {err}", dir.display()))
            })?;

        info!(
            dir = %dir.display(),
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "agreement config watcher started"
        );

        Ok(Self {
            _watcher: watcher,
            store,
        })
    }

    /// Store kept up to date by this watcher.
    #[must_use]
    pub fn store(&self) -> &Arc<AgreementStore> {
        &self.store
    }
}
