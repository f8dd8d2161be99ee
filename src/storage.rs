//! Key-value persistence behind the stores.
//!
//! Each store owns one namespace and writes its whole collection on every
//! mutation. A failed write never rolls back the in-memory change: it is
//! logged and remembered so a front end can surface it.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::constants;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization failed: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Durable slot per namespace key.
pub trait KeyValueStore: Send + Sync {
  fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// --- File backend ---

/// One `<key>.json` file per namespace inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  dir: PathBuf,
}

impl JsonFileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl KeyValueStore for JsonFileStore {
  fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
    let path = self.path_for(key);
    match std::fs::read_to_string(&path) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(StorageError::Io { path, source }),
    }
  }

  fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
    std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io { path: self.dir.clone(), source })?;
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value).map_err(|source| StorageError::Io { path: tmp.clone(), source })?;
    std::fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
  }
}

// --- In-memory backend ---

/// In-memory slots. `set_failing(true)` makes every write fail, like a full or disabled backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
  slots: Mutex<HashMap<String, String>>,
  failing: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Raw blob stored under `key`, if any.
  pub fn raw(&self, key: &str) -> Option<String> {
    self.slots.lock().ok().and_then(|slots| slots.get(key).cloned())
  }

  pub fn insert_raw(&self, key: &str, value: &str) {
    if let Ok(mut slots) = self.slots.lock() {
      slots.insert(key.to_string(), value.to_string());
    }
  }
}

impl KeyValueStore for MemoryStore {
  fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.raw(key))
  }

  fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(StorageError::Unavailable("quota exceeded".to_string()));
    }
    let mut slots = self.slots.lock().map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))?;
    slots.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

// --- Persistent cell ---

/// On-disk wrapper around each store's state.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
  state: T,
  #[serde(default)]
  version: u32,
}

/// A value mirrored to one namespace of a [`KeyValueStore`].
pub struct PersistentCell<T> {
  backend: Arc<dyn KeyValueStore>,
  key: String,
  value: T,
  last_error: Option<String>,
}

impl<T> PersistentCell<T>
where
  T: Serialize + DeserializeOwned + Default,
{
  /// Load the namespace, falling back to `T::default()` when it is missing or unreadable.
  pub fn rehydrate(backend: Arc<dyn KeyValueStore>, key: &str) -> Self {
    let value = match backend.load(key) {
      Ok(Some(raw)) => match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) => {
          debug!(key, version = envelope.version, "storage: rehydrated");
          envelope.state
        }
        Err(e) => {
          warn!(key, err = %e, "storage: unreadable blob, starting empty");
          T::default()
        }
      },
      Ok(None) => T::default(),
      Err(e) => {
        warn!(key, err = %e, "storage: load failed, starting empty");
        T::default()
      }
    };
    Self { backend, key: key.to_string(), value, last_error: None }
  }

  pub fn get(&self) -> &T {
    &self.value
  }

  /// Mutate the value, then write it through. The mutation stands even if the write fails.
  pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
    let out = f(&mut self.value);
    self.persist();
    out
  }

  /// The most recent write failure, cleared by the next successful write.
  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  fn persist(&mut self) {
    let result = serde_json::to_string(&Envelope { state: &self.value, version: constants().storage_version })
      .map_err(StorageError::from)
      .and_then(|raw| self.backend.save(&self.key, &raw));
    match result {
      Ok(()) => self.last_error = None,
      Err(e) => {
        warn!(key = %self.key, err = %e, "storage: write failed, change kept in memory only");
        self.last_error = Some(e.to_string());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_store_round_trips_and_creates_dir() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested"));
    assert!(store.load("k").unwrap().is_none());
    store.save("k", "{\"a\":1}").unwrap();
    assert_eq!(store.load("k").unwrap().as_deref(), Some("{\"a\":1}"));
    assert!(dir.path().join("nested").join("k.json").exists());
  }

  #[test]
  fn cell_survives_restart() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut cell: PersistentCell<Vec<String>> = PersistentCell::rehydrate(Arc::clone(&backend), "ids");
    cell.update(|ids| ids.push("one".to_string()));

    let reloaded: PersistentCell<Vec<String>> = PersistentCell::rehydrate(backend, "ids");
    assert_eq!(reloaded.get(), &vec!["one".to_string()]);
  }

  #[test]
  fn cell_writes_envelope() {
    let backend = Arc::new(MemoryStore::new());
    let mut cell: PersistentCell<Vec<String>> = PersistentCell::rehydrate(backend.clone(), "ids");
    cell.update(|ids| ids.push("x".to_string()));
    let raw: serde_json::Value = serde_json::from_str(&backend.raw("ids").unwrap()).unwrap();
    assert_eq!(raw["state"][0], "x");
    assert_eq!(raw["version"], 0);
  }

  #[test]
  fn cell_ignores_corrupt_blob() {
    let backend = Arc::new(MemoryStore::new());
    backend.insert_raw("ids", "not json");
    let cell: PersistentCell<Vec<String>> = PersistentCell::rehydrate(backend, "ids");
    assert!(cell.get().is_empty());
  }

  #[test]
  fn failed_write_keeps_memory_state() {
    let backend = Arc::new(MemoryStore::new());
    backend.set_failing(true);
    let mut cell: PersistentCell<Vec<String>> = PersistentCell::rehydrate(backend.clone(), "ids");
    cell.update(|ids| ids.push("kept".to_string()));
    assert_eq!(cell.get().len(), 1);
    assert!(cell.last_error().unwrap().contains("quota"));
    assert!(backend.raw("ids").is_none());

    backend.set_failing(false);
    cell.update(|ids| ids.push("second".to_string()));
    assert!(cell.last_error().is_none());
    assert!(backend.raw("ids").unwrap().contains("second"));
  }
}
