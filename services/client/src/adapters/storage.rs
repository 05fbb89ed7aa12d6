//! services/client/src/adapters/storage.rs
//!
//! A file-backed implementation of the `KeyValueStorage` port.
//! All keys live in one JSON object on disk; each value is an opaque string.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use movie_discovery_core::ports::{KeyValueStorage, PortError, PortResult};
use tracing::debug;

/// Persists string values under string keys in a single JSON file.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    // Held across load and store so each `set` and `update` is one atomic cycle.
    guard: Mutex<()>,
}

impl JsonFileStorage {
    /// Creates a new `JsonFileStorage`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PortResult<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| storage_error(&self.path, e))
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let encoded = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Write beside the target and rename so a crash never leaves half a file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(|e| storage_error(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let _held = self
            .guard
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let _held = self
            .guard
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries)?;
        debug!(key, path = %self.path.display(), "Storage slot written");
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> PortResult<Option<String>>,
    ) -> PortResult<()> {
        let _held = self
            .guard
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        let mut entries = self.load()?;
        let Some(value) = apply(entries.get(key).cloned())? else {
            return Ok(());
        };
        entries.insert(key.to_string(), value);
        self.store(&entries)?;
        debug!(key, path = %self.path.display(), "Storage slot updated");
        Ok(())
    }
}
