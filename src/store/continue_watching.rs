use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::constants;
use crate::model::ContinueWatchingEntry;
use crate::storage::{KeyValueStore, PersistentCell};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedHistory {
  #[serde(default)]
  items: Vec<ContinueWatchingEntry>,
}

/// Viewing history, most recent first, one entry per playlist.
pub struct ContinueWatchingStore {
  cell: PersistentCell<SavedHistory>,
  capacity: usize,
}

impl ContinueWatchingStore {
  pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
    Self::with_capacity(backend, constants().continue_watching_capacity)
  }

  pub fn with_capacity(backend: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
    let mut cell: PersistentCell<SavedHistory> =
      PersistentCell::rehydrate(backend, &constants().continue_watching_storage_key);
    if cell.get().items.len() > capacity {
      cell.update(|saved| saved.items.truncate(capacity));
    }
    Self { cell, capacity }
  }

  pub fn entries(&self) -> &[ContinueWatchingEntry] {
    &self.cell.get().items
  }

  pub fn get(&self, playlist_id: &str) -> Option<&ContinueWatchingEntry> {
    self.entries().iter().find(|e| e.playlist_id == playlist_id)
  }

  /// Record that `video_index` of the playlist was watched just now. Replaces any
  /// earlier entry for the playlist and evicts the oldest beyond capacity.
  pub fn add(&mut self, playlist_id: &str, video_index: usize) {
    let entry = ContinueWatchingEntry {
      playlist_id: playlist_id.to_string(),
      video_index,
      last_watched: Utc::now(),
    };
    let capacity = self.capacity;
    self.cell.update(|saved| {
      saved.items.retain(|e| e.playlist_id != playlist_id);
      saved.items.insert(0, entry);
      saved.items.truncate(capacity);
    });
  }

  /// Returns whether an entry existed.
  pub fn remove(&mut self, playlist_id: &str) -> bool {
    if self.get(playlist_id).is_none() {
      return false;
    }
    self.cell.update(|saved| saved.items.retain(|e| e.playlist_id != playlist_id));
    true
  }

  pub fn clear(&mut self) {
    self.cell.update(|saved| saved.items.clear());
  }

  pub fn last_error(&self) -> Option<&str> {
    self.cell.last_error()
  }
}
