use anyhow::{Context, Result};
use log::warn;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Key holding the "notifications enabled" preference.
pub const NOTIFICATIONS_ENABLED_KEY: &str = "notifications_enabled";

type Items = BTreeMap<String, String>;

/// String key-value preferences persisted as a flat JSON object.
///
/// Behaves like a browser local-storage area: every value is a string and a
/// missing file simply means "nothing stored yet". A store without a path
/// keeps values for the lifetime of the process only.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    data: RwLock<Items>,
}

impl PreferenceStore {
    /// Opens the store at `path`. An unreadable or corrupt file is logged and
    /// treated as empty so callers fall back to defaults.
    pub fn open(path: PathBuf) -> Self {
        let data = read_items(&path).unwrap_or_else(|err| {
            warn!("Ignoring unreadable preferences: {err:#}");
            Items::new()
        });

        Self {
            path: Some(path),
            data: RwLock::new(data),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Items::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    /// Stores `value` under `key`. The in-memory value is updated even when
    /// writing the file fails.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.write();
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let mut guard = self.write();
        if guard.remove(key).is_some() {
            self.persist(&guard)?;
        }
        Ok(())
    }

    /// Persisted "notifications enabled" flag. Anything other than an explicit
    /// `"false"` counts as enabled.
    pub fn load(&self) -> bool {
        self.get_item(NOTIFICATIONS_ENABLED_KEY)
            .map(|value| value != "false")
            .unwrap_or(true)
    }

    /// Persists the flag. Failures are logged and otherwise ignored.
    pub fn save(&self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(err) = self.set_item(NOTIFICATIONS_ENABLED_KEY, value) {
            warn!("Failed to persist notification preference: {err:#}");
        }
    }

    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = read_items(path)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, items: &Items) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory {}", parent.display())
            })?;
        }

        let serialized = serde_json::to_string_pretty(items)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write preferences to {}", path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Items> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Items> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn read_items(path: &Path) -> Result<Items> {
    if !path.exists() {
        return Ok(Items::new());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Malformed preferences in {}", path.display()))
}
