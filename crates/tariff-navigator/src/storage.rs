//! Durable key-value storage for per-user navigator state.
//!
//! The navigator persists two keys (`recent-codes`, `favorite-codes`), each a
//! JSON array of codes. Storage is abstracted behind [`KeyValueStore`] so the
//! history store can be exercised with [`MemoryStore`] in tests while the CLI
//! uses [`JsonFileStore`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tariff_model::PersistenceError;

/// Local durable key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// In-memory store. State lives as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON object mapping keys to string values.
///
/// The file is read once when opened. Every `set` rewrites the whole file
/// through a temp file and rename so a crash never leaves a torn file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let key = path.display().to_string();
        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                PersistenceError::Deserialization {
                    key,
                    source: Box::new(e),
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No state file at {:?}, starting empty", path);
                BTreeMap::new()
            }
            Err(e) => return Err(PersistenceError::io("read", key, e)),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default location in the platform data directory.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "TariffNavigator", "tariff-navigator")
            .map(|dirs| dirs.data_dir().join("navigator-state.json"))
            .unwrap_or_else(|| PathBuf::from("navigator-state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        let key = self.path.display().to_string();
        let content =
            serde_json::to_string_pretty(values).map_err(|e| PersistenceError::Serialization {
                key: key.clone(),
                source: Box::new(e),
            })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::io("create directory", key.clone(), e))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)
            .map_err(|e| PersistenceError::io("create", key.clone(), e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| PersistenceError::io("write", key.clone(), e))?;
        file.sync_all()
            .map_err(|e| PersistenceError::io("sync", key.clone(), e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| PersistenceError::io("rename", key, e))?;

        tracing::debug!("Saved navigator state to {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.lock();
        let previous = values.insert(key.to_string(), value.to_string());
        if let Err(error) = self.write_all(&values) {
            // Keep memory consistent with disk
            match previous {
                Some(previous) => values.insert(key.to_string(), previous),
                None => values.remove(key),
            };
            return Err(error);
        }
        Ok(())
    }
}
