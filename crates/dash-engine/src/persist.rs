//! Dashboard persistence.
//!
//! The whole dashboard is stored as one JSON document under a single key of a
//! key-value [`StateStore`]. Loading never fails: unreadable or corrupt state
//! is logged and replaced by an empty (or example) dashboard, and categories are
//! merged one by one so a single damaged category does not take the others with
//! it.
//!
//! Separate processes share one state file. A [`Session`] holds the store's
//! lock for each read-modify-write cycle and re-reads the stored document
//! first, so edits from another session are never overwritten.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use dash_model::CategoryKey;
use directories::ProjectDirs;
use fs2::FileExt;

use crate::category::CategorySnapshot;
use crate::config::DashConfig;
use crate::dashboard::{Dashboard, DashboardSnapshot};
use crate::error::{EngineError, Result};
use crate::example::example_dashboard;

/// A string key-value store.
pub trait StateStore {
    /// Returns `None` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn save(&mut self, key: &str, value: &str) -> Result<()>;

    /// Keeps other writers of `key` out until the returned guard drops.
    /// Stores private to one process need no lock.
    fn lock(&self, _key: &str) -> Result<StoreLock> {
        Ok(StoreLock { file: None })
    }
}

/// Exclusive hold on one key of a [`StateStore`], released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform data directory for the dashboard.
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "analytics-dashboard")
            .ok_or(EngineError::NoStateDirectory)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Lock file guarding `key`. The state file itself is replaced on every
    /// save, so it cannot carry the lock.
    pub fn lock_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.lock"))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(EngineError::StoreIo { path, source }),
        }
    }

    /// Writes through a temp file and a rename so a crash never leaves a
    /// truncated document behind.
    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| EngineError::StoreIo { path, source }
        };
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(value.as_bytes())
            .map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;
        fs::rename(&temp_path, &path).map_err(io_err(&path))?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "saved dashboard state");
        Ok(())
    }

    fn lock(&self, key: &str) -> Result<StoreLock> {
        let path = self.lock_path_for(key);
        let io_err = |source: std::io::Error| EngineError::StoreIo {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;
        tracing::trace!(path = %path.display(), "locked dashboard state");
        Ok(StoreLock { file: Some(file) })
    }
}

/// Serializes the dashboard under the configured key and marks it clean.
pub fn save_dashboard(store: &mut impl StateStore, dashboard: &mut Dashboard) -> Result<()> {
    let json = serde_json::to_string(&dashboard.snapshot())?;
    store.save(&dashboard.config().storage_key, &json)?;
    dashboard.mark_saved();
    Ok(())
}

/// Loads the dashboard stored under the configured key.
///
/// Missing or corrupt state yields the fallback dashboard. Inside a readable
/// document, unknown category keys are ignored and a category that fails to
/// decode starts empty.
pub fn load_dashboard(store: &impl StateStore, config: DashConfig) -> Dashboard {
    match read_snapshot(store, &config.storage_key) {
        Some(snapshot) => {
            tracing::info!(
                key = %config.storage_key,
                categories = snapshot.categories.len(),
                "restored dashboard state"
            );
            Dashboard::from_snapshot(config, snapshot)
        }
        None => fallback(config),
    }
}

/// The stored document, or `None` when it is missing or unreadable.
fn read_snapshot(store: &impl StateStore, key: &str) -> Option<DashboardSnapshot> {
    let text = match store.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::debug!(key, "no persisted state");
            return None;
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "could not read persisted state");
            return None;
        }
    };
    match decode_snapshot(&text) {
        Ok(snapshot) => Some(snapshot),
        Err(message) => {
            tracing::warn!(key, %message, "persisted state is corrupt");
            None
        }
    }
}

fn fallback(config: DashConfig) -> Dashboard {
    if config.seed_example {
        example_dashboard(config)
    } else {
        Dashboard::new(config)
    }
}

fn decode_snapshot(text: &str) -> std::result::Result<DashboardSnapshot, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let categories = value
        .get("categories")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| "missing 'categories' object".to_string())?;
    let mut snapshot = DashboardSnapshot::default();
    for (name, entry) in categories {
        let Ok(key) = name.parse::<CategoryKey>() else {
            tracing::debug!(category = %name, "ignoring unknown category");
            continue;
        };
        match serde_json::from_value::<CategorySnapshot>(entry.clone()) {
            Ok(category) => {
                snapshot.categories.insert(key, category);
            }
            Err(err) => {
                tracing::warn!(category = %key, error = %err, "dropping corrupt category state");
            }
        }
    }
    Ok(snapshot)
}

/// A dashboard coupled to the store it persists into.
///
/// Every update runs under the store's lock: the stored document is re-read,
/// the edit applied, and a dirty result written back before the lock is
/// released. Write failures are logged, never raised: the in-memory state
/// stays authoritative and is retried on the next update.
#[derive(Debug)]
pub struct Session<S: StateStore> {
    dashboard: Dashboard,
    store: S,
}

impl<S: StateStore> Session<S> {
    pub fn open(store: S, config: DashConfig) -> Self {
        let dashboard = load_dashboard(&store, config);
        Self { dashboard, store }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies `edit` and persists the result if anything changed.
    pub fn update<T>(&mut self, edit: impl FnOnce(&mut Dashboard) -> T) -> T {
        let _lock = self.lock();
        self.refresh();
        let out = edit(&mut self.dashboard);
        self.persist();
        out
    }

    /// Applies `edit` as one unit: when it returns `Err` every change it made
    /// is undone and nothing is written.
    pub fn try_update<T, E>(
        &mut self,
        edit: impl FnOnce(&mut Dashboard) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let _lock = self.lock();
        self.refresh();
        let before = self.dashboard.clone();
        match edit(&mut self.dashboard) {
            Ok(out) => {
                self.persist();
                Ok(out)
            }
            Err(err) => {
                tracing::debug!("edit failed, restoring previous state");
                self.dashboard = before;
                Err(err)
            }
        }
    }

    /// Persists now, surfacing any error.
    pub fn save(&mut self) -> Result<()> {
        let _lock = self.store.lock(&self.dashboard.config().storage_key)?;
        save_dashboard(&mut self.store, &mut self.dashboard)
    }

    pub fn into_parts(self) -> (Dashboard, S) {
        (self.dashboard, self.store)
    }

    fn lock(&self) -> Option<StoreLock> {
        match self.store.lock(&self.dashboard.config().storage_key) {
            Ok(lock) => Some(lock),
            Err(err) => {
                tracing::warn!(error = %err, "could not lock dashboard state");
                None
            }
        }
    }

    /// Picks up what other sessions saved. Unsaved local edits are kept.
    fn refresh(&mut self) {
        if self.dashboard.is_dirty() {
            return;
        }
        if let Some(snapshot) = read_snapshot(&self.store, &self.dashboard.config().storage_key) {
            self.dashboard.reload(snapshot);
        }
    }

    fn persist(&mut self) {
        if self.dashboard.is_dirty()
            && let Err(err) = save_dashboard(&mut self.store, &mut self.dashboard)
        {
            tracing::warn!(error = %err, "could not persist dashboard state");
        }
    }
}
