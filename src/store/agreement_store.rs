//! In-memory agreement configuration with wholesale reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, info_span, warn};

use crate::config::{GlobalConfig, CONFIG_FILE};
use crate::models::agreement::{Agreement, ConfigSnapshot, GuestNotice, SharedSnapshot};
use crate::store::loader::AgreementLoader;

/// Thread-safe owner of the current [`ConfigSnapshot`].
///
/// Readers get clones; a reload parses outside the lock and swaps the
/// snapshot in one step, so nobody ever observes a half-built state.
#[derive(Debug)]
pub struct AgreementStore {
    store_dir: PathBuf,
    settings_file: PathBuf,
    current: Mutex<SharedSnapshot>,
}

impl AgreementStore {
    /// Create an empty store for `store_dir/terms-of-service-config.xml`.
    ///
    /// Nothing is loaded until the first [`Self::reload`].
    #[must_use]
    pub fn new(store_dir: &Path) -> Self {
        Self {
            store_dir: store_dir.to_owned(),
            settings_file: store_dir.join(CONFIG_FILE),
            current: Mutex::new(Arc::new(ConfigSnapshot::default())),
        }
    }

    /// Create a store for the directory named by `config`.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(&config.store_dir())
    }

    /// Directory agreement text files are resolved against.
    #[must_use]
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Re-read the config file and replace the snapshot.
    ///
    /// A missing file clears everything. Read or parse failures are logged
    /// and leave the previous snapshot in place.
    pub fn reload(&self) {
        let _span = info_span!("tos_reload", path = %self.settings_file.display()).entered();

        let loaded = match AgreementLoader::load(&self.settings_file, &self.store_dir) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(
                    %err,
                    "error while loading terms of service settings, keeping previous values"
                );
                return;
            }
        };

        let (agreements, guest_notice) = match loaded {
            Some(loaded) => {
                if loaded.agreement_elements == 0 {
                    debug!("no 'agreement' elements found");
                }
                (loaded.agreements, loaded.guest_notice)
            }
            None => (Vec::new(), None),
        };

        if agreements.is_empty() {
            warn!("no terms of service rules were found");
        }

        let mut guard = self.lock();
        let generation = guard.generation + 1;
        let count = agreements.len();
        *guard = Arc::new(ConfigSnapshot {
            agreements,
            guest_notice,
            generation,
        });
        drop(guard);

        info!(agreements = count, generation, "loaded terms of service settings");
    }

    /// Current snapshot handle.
    #[must_use]
    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.lock())
    }

    /// Copy of all agreements in document order.
    #[must_use]
    pub fn agreements(&self) -> Vec<Agreement> {
        self.lock().agreements.clone()
    }

    /// First agreement with the given id.
    ///
    /// Duplicate ids are not rejected at load time; the earliest one in the
    /// file shadows the rest.
    #[must_use]
    pub fn agreement(&self, id: &str) -> Option<Agreement> {
        self.lock().agreement(id).cloned()
    }

    /// Configured guest notice, if complete.
    #[must_use]
    pub fn guest_notice(&self) -> Option<GuestNotice> {
        self.lock().guest_notice.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SharedSnapshot> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a consistent snapshot.
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
