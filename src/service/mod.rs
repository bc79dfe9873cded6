//! The request surface over one vault.
//!
//! `VaultService` wraps a `VaultStore` behind a lock and exposes the
//! operations a front end drives: open, get, set, list, merge and so on.
//! Every call is logged at info level; masters show up as `'***'`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use zeroize::Zeroizing;

use crate::config::settings::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::{FileBacking, LineError, VaultStore};

/// Counters of one live record, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    pub name: String,
    pub add_count: u64,
    pub del_count: u64,
}

struct State {
    store: VaultStore,
    /// Exit status handed to `stop`, once stopped.
    stopped: Option<i32>,
}

/// Thread-safe handle over a single vault.
pub struct VaultService {
    state: Mutex<State>,
}

impl VaultService {
    pub fn new(store: VaultStore) -> Self {
        Self {
            state: Mutex::new(State {
                store,
                stopped: None,
            }),
        }
    }

    /// A service over the vault file `settings` points at inside `dir`.
    pub fn from_settings(settings: &Settings, dir: &Path) -> Self {
        let backing = FileBacking::new(settings.vault_path(dir));
        let store = VaultStore::new(Box::new(backing), Arc::new(settings.cipher_spec()))
            .with_format(settings.record_format());
        Self::new(store)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the store unless the service has been stopped.
    fn with_store<T>(&self, f: impl FnOnce(&mut VaultStore) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        if state.stopped.is_some() {
            return Err(VaultError::Stopped);
        }
        f(&mut state.store)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn open(&self, master: &str) -> Result<()> {
        tracing::info!("open(master='***')");
        self.with_store(|store| store.open(master))
    }

    pub fn create(&self, master: &str) -> Result<()> {
        tracing::info!("create(master='***')");
        self.with_store(|store| store.create(master))
    }

    /// Whether the vault is open; closes it (persisting) when
    /// `then_close` is set.
    pub fn is_open(&self, then_close: bool) -> Result<bool> {
        tracing::info!(then_close, "is_open");
        self.with_store(|store| {
            let open = store.is_open();
            if open && then_close {
                store.close(true)?;
            }
            Ok(open)
        })
    }

    pub fn close(&self, persist: bool) -> Result<()> {
        tracing::info!(persist, "close");
        self.with_store(|store| store.close(persist))
    }

    /// Persist and close the vault, then refuse every further request.
    ///
    /// The service counts as stopped even when the final save fails.
    pub fn stop(&self, status: i32) -> Result<()> {
        tracing::info!(status, "stop");
        let mut state = self.lock();
        if state.stopped.is_some() {
            return Err(VaultError::Stopped);
        }
        state.stopped = Some(status);
        state.store.close(true)
    }

    /// The status passed to `stop`, if it has been called.
    pub fn stopped(&self) -> Option<i32> {
        self.lock().stopped
    }

    pub fn ping(&self, info: &str) -> String {
        tracing::info!(info, "ping");
        info.to_string()
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// The live secret stored under `name`.
    pub fn get(&self, name: &str) -> Result<Zeroizing<String>> {
        tracing::info!(name, "get");
        self.with_store(|store| {
            let record = store.get(name)?;
            if record.is_deleted() {
                return Err(VaultError::RecordNotFound(name.to_string()));
            }
            Ok(Zeroizing::new(record.secret().to_string()))
        })
    }

    /// Store `secret` under `name`, or a password generated from
    /// `recipe` when one is given.  Returns what ended up stored.
    pub fn set(
        &self,
        name: &str,
        secret: Option<&str>,
        recipe: Option<&str>,
    ) -> Result<Zeroizing<String>> {
        tracing::info!(name, secret = secret.map(|_| "***"), recipe, "set");
        self.with_store(|store| match (recipe, secret) {
            (Some(recipe), _) => store.set_random(name, recipe),
            (None, Some(secret)) => {
                store.set(name, secret)?;
                Ok(Zeroizing::new(secret.to_string()))
            }
            (None, None) => Err(VaultError::MissingSecret(name.to_string())),
        })
    }

    pub fn unset(&self, name: &str) -> Result<()> {
        tracing::info!(name, "unset");
        self.with_store(|store| store.unset(name))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        tracing::info!(name, "delete");
        self.with_store(|store| store.delete(name))
    }

    pub fn list(&self, filter: &str) -> Result<Vec<String>> {
        tracing::info!(filter, "list");
        self.with_store(|store| store.list(filter))
    }

    /// Like `list`, with the version counters of each name.
    pub fn list_details(&self, filter: &str) -> Result<Vec<RecordInfo>> {
        tracing::info!(filter, "list_details");
        self.with_store(|store| {
            let names = store.list(filter)?;
            names
                .into_iter()
                .map(|name| {
                    let record = store.get(&name)?;
                    Ok(RecordInfo {
                        add_count: record.add_count(),
                        del_count: record.del_count(),
                        name,
                    })
                })
                .collect()
        })
    }

    /// Lines the last open had to skip.
    pub fn rejected_lines(&self) -> Vec<LineError> {
        self.lock().store.rejected_lines().to_vec()
    }

    // ------------------------------------------------------------------
    // Whole-vault operations
    // ------------------------------------------------------------------

    /// Merge the vault at `path`, opened with `master`, into this one.
    ///
    /// The peer is opened with this vault's cipher and format and closed
    /// again without saving.
    pub fn merge(&self, path: &Path, master: &str) -> Result<()> {
        tracing::info!(path = %path.display(), "merge(master='***')");
        self.with_store(|store| {
            if !store.is_open() {
                return Err(VaultError::NotOpen("merge"));
            }
            let mut peer = store.sibling(Box::new(FileBacking::new(path)));
            peer.open(master)?;
            let merged = store.merge(&peer);
            peer.close(false)?;
            merged
        })
    }

    pub fn save(&self, force: bool) -> Result<()> {
        tracing::info!(force, "save");
        self.with_store(|store| store.save(force))
    }

    pub fn set_master(&self, master: &str) -> Result<()> {
        tracing::info!("set_master(master='***')");
        self.with_store(|store| store.set_master(master))
    }
}
