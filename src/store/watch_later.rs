use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::constants;
use crate::storage::{KeyValueStore, PersistentCell};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedWatchLater {
  #[serde(rename = "watchLater", default)]
  watch_later: Vec<String>,
}

/// Set of playlist ids saved for later, kept in insertion order.
pub struct WatchLaterStore {
  cell: PersistentCell<SavedWatchLater>,
}

impl WatchLaterStore {
  pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
    Self { cell: PersistentCell::rehydrate(backend, &constants().watch_later_storage_key) }
  }

  pub fn ids(&self) -> &[String] {
    &self.cell.get().watch_later
  }

  pub fn contains(&self, playlist_id: &str) -> bool {
    self.ids().iter().any(|id| id == playlist_id)
  }

  /// No-op when already present. Returns whether the id was inserted.
  pub fn add(&mut self, playlist_id: &str) -> bool {
    if self.contains(playlist_id) {
      return false;
    }
    self.cell.update(|saved| saved.watch_later.push(playlist_id.to_string()));
    true
  }

  /// Returns whether the id was present.
  pub fn remove(&mut self, playlist_id: &str) -> bool {
    if !self.contains(playlist_id) {
      return false;
    }
    self.cell.update(|saved| saved.watch_later.retain(|id| id != playlist_id));
    true
  }

  pub fn last_error(&self) -> Option<&str> {
    self.cell.last_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStore;

  #[test]
  fn add_is_idempotent() {
    let mut store = WatchLaterStore::open(Arc::new(MemoryStore::new()));
    assert!(store.add("p1"));
    assert!(!store.add("p1"));
    assert_eq!(store.ids(), ["p1".to_string()]);
  }

  #[test]
  fn contains_and_remove() {
    let mut store = WatchLaterStore::open(Arc::new(MemoryStore::new()));
    store.add("p1");
    store.add("p2");
    assert!(store.contains("p2"));
    assert!(store.remove("p2"));
    assert!(!store.remove("p2"));
    assert!(!store.contains("p2"));
    assert_eq!(store.ids(), ["p1".to_string()]);
  }

  #[test]
  fn rehydrates_watch_later_field() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let key = &constants().watch_later_storage_key;
    backend.save(key, r#"{"state":{"watchLater":["p1","p2"]},"version":0}"#).unwrap();

    let mut store = WatchLaterStore::open(Arc::clone(&backend));
    assert_eq!(store.ids(), ["p1".to_string(), "p2".to_string()]);
    store.remove("p1");
    let value: serde_json::Value = serde_json::from_str(&backend.load(key).unwrap().unwrap()).unwrap();
    assert_eq!(value["state"]["watchLater"], serde_json::json!(["p2"]));
  }
}
