use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::constants::constants;
use crate::model::{NewPlaylist, Playlist, PlaylistPatch, normalize_tags};
use crate::storage::{KeyValueStore, PersistentCell};

/// Persisted as `{"playlists": [...]}` under the namespace's `state`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedPlaylists {
  #[serde(default)]
  playlists: Vec<Playlist>,
}

/// All playlists, drafts included, in creation order.
pub struct PlaylistStore {
  cell: PersistentCell<SavedPlaylists>,
}

impl PlaylistStore {
  pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
    Self { cell: PersistentCell::rehydrate(backend, &constants().playlist_storage_key) }
  }

  pub fn all(&self) -> &[Playlist] {
    &self.cell.get().playlists
  }

  pub fn get(&self, id: &str) -> Option<&Playlist> {
    self.all().iter().find(|p| p.id == id)
  }

  /// Append a playlist with a fresh id and timestamps; returns the id.
  pub fn add(&mut self, new: NewPlaylist) -> String {
    let now = Utc::now();
    let playlist = Playlist {
      id: Uuid::new_v4().to_string(),
      name: new.name,
      description: new.description,
      thumbnail: new.thumbnail,
      videos: new.videos,
      tags: normalize_tags(new.tags),
      is_draft: new.is_draft,
      created_at: now,
      updated_at: now,
      source_url: new.source_url,
    };
    let id = playlist.id.clone();
    debug!(id = %id, draft = playlist.is_draft, "playlists: add");
    self.cell.update(|saved| saved.playlists.push(playlist));
    id
  }

  /// Merge `patch` into the playlist and stamp `updated_at`. Returns `None` for an unknown id.
  pub fn update(&mut self, id: &str, patch: PlaylistPatch) -> Option<&Playlist> {
    let idx = self.all().iter().position(|p| p.id == id)?;
    self.cell.update(|saved| {
      let playlist = &mut saved.playlists[idx];
      patch.apply(playlist);
      playlist.updated_at = Utc::now();
    });
    self.all().get(idx)
  }

  /// Remove the playlist. Returns whether it existed.
  pub fn delete(&mut self, id: &str) -> bool {
    if self.get(id).is_none() {
      return false;
    }
    self.cell.update(|saved| saved.playlists.retain(|p| p.id != id));
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

  fn new_playlist(name: &str) -> NewPlaylist {
    NewPlaylist { name: name.to_string(), is_draft: true, ..Default::default() }
  }

  #[test]
  fn add_assigns_unique_ids_and_timestamps() {
    let mut store = PlaylistStore::open(Arc::new(MemoryStore::new()));
    let a = store.add(new_playlist("A"));
    let b = store.add(new_playlist("B"));
    assert_ne!(a, b);
    let p = store.get(&a).unwrap();
    assert_eq!(p.created_at, p.updated_at);
    assert_eq!(store.all().len(), 2);
  }

  #[test]
  fn add_normalizes_tags() {
    let mut store = PlaylistStore::open(Arc::new(MemoryStore::new()));
    let id = store.add(NewPlaylist { tags: vec!["L1-TI".into(), "l1-ti".into(), " ".into()], ..new_playlist("A") });
    assert_eq!(store.get(&id).unwrap().tags, vec!["L1-TI"]);
  }

  #[test]
  fn update_merges_and_stamps() {
    let mut store = PlaylistStore::open(Arc::new(MemoryStore::new()));
    let id = store.add(new_playlist("A"));
    let created = store.get(&id).unwrap().created_at;

    let updated = store.update(&id, PlaylistPatch { name: Some("Renamed".into()), ..Default::default() }).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert!(updated.is_draft);
    assert_eq!(updated.id, id);
    assert_eq!(updated.created_at, created);
    assert!(updated.updated_at >= created);
  }

  #[test]
  fn update_unknown_id_is_none() {
    let mut store = PlaylistStore::open(Arc::new(MemoryStore::new()));
    assert!(store.update("missing", PlaylistPatch::draft(false)).is_none());
  }

  #[test]
  fn delete_removes_entry() {
    let mut store = PlaylistStore::open(Arc::new(MemoryStore::new()));
    let id = store.add(new_playlist("A"));
    assert!(store.delete(&id));
    assert!(!store.delete(&id));
    assert!(store.all().is_empty());
  }

  #[test]
  fn reopen_rehydrates() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let id = PlaylistStore::open(Arc::clone(&backend)).add(new_playlist("Persisted"));
    let store = PlaylistStore::open(backend);
    assert_eq!(store.get(&id).unwrap().name, "Persisted");
  }

  #[test]
  fn rehydrates_blob_written_by_web_client() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let blob = r#"{"state":{"playlists":[{"id":"p1","name":"OS","description":"Kernels","videos":[
      {"id":"v1","title":"Intro","thumbnail":"t","duration":"PT4M","url":"https://www.youtube.com/watch?v=v1"}],
      "tags":["L2-T2"],"isDraft":false,"createdAt":"2024-03-01T10:00:00.000Z",
      "updatedAt":"2024-03-02T10:00:00.000Z","youtubeUrl":"https://www.youtube.com/playlist?list=PL1"}]},"version":0}"#;
    backend.save(&constants().playlist_storage_key, blob).unwrap();

    let mut store = PlaylistStore::open(Arc::clone(&backend));
    assert_eq!(store.all().len(), 1);
    let p = store.get("p1").unwrap();
    assert_eq!(p.name, "OS");
    assert!(!p.is_draft);
    assert_eq!(p.videos[0].id, "v1");

    store.add(new_playlist("B"));
    let raw = backend.load(&constants().playlist_storage_key).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["state"]["playlists"].as_array().unwrap().len(), 2);
  }
}
