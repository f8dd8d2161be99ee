//! The course library: one owned container for every persisted collection.
//!
//! Front ends hold a `Library` (or a reference to it) and observe changes through
//! [`Library::subscribe`], which yields a revision counter bumped on every mutation.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::model::{ContinueWatchingEntry, NewPlaylist, Playlist, PlaylistPatch};
use crate::storage::KeyValueStore;
use crate::store::{ContinueWatchingStore, PlaylistStore, WatchLaterStore};
use crate::youtube::FetchError;

#[derive(Debug, Error)]
pub enum LibraryError {
  #[error("playlist not found: {0}")]
  NotFound(String),

  #[error("video {index} is out of range for a playlist of {len} videos")]
  VideoOutOfRange { index: usize, len: usize },

  #[error("cannot {action} a {state} playlist")]
  InvalidTransition { action: &'static str, state: &'static str },

  #[error("there are unsaved changes; publish or revert them first")]
  UnsavedChanges,

  #[error("playlist has no source URL to refresh from")]
  NoSourceUrl,

  #[error(transparent)]
  Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, LibraryError>;

pub struct Library {
  playlists: PlaylistStore,
  watch_later: WatchLaterStore,
  history: ContinueWatchingStore,
  revision: watch::Sender<u64>,
}

impl Library {
  pub fn open(backend: Arc<dyn KeyValueStore>) -> Self {
    let (revision, _) = watch::channel(0);
    Self {
      playlists: PlaylistStore::open(Arc::clone(&backend)),
      watch_later: WatchLaterStore::open(Arc::clone(&backend)),
      history: ContinueWatchingStore::open(backend),
      revision,
    }
  }

  /// Receiver that changes whenever the library is mutated.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.revision.subscribe()
  }

  fn changed(&self) {
    self.revision.send_modify(|rev| *rev += 1);
  }

  /// The latest storage write failure across all stores, if the last write of any store failed.
  pub fn persistence_error(&self) -> Option<&str> {
    self.playlists.last_error().or(self.watch_later.last_error()).or(self.history.last_error())
  }

  // --- Playlists ---

  pub fn playlists(&self) -> &[Playlist] {
    self.playlists.all()
  }

  pub fn playlist(&self, id: &str) -> Option<&Playlist> {
    self.playlists.get(id)
  }

  pub fn create_playlist(&mut self, new: NewPlaylist) -> String {
    let id = self.playlists.add(new);
    self.changed();
    id
  }

  pub fn update_playlist(&mut self, id: &str, patch: PlaylistPatch) -> Result<&Playlist> {
    if self.playlists.get(id).is_none() {
      return Err(LibraryError::NotFound(id.to_string()));
    }
    self.changed();
    self.playlists.update(id, patch).ok_or_else(|| LibraryError::NotFound(id.to_string()))
  }

  /// Delete a playlist and every watch-later and history entry pointing at it.
  pub fn delete_playlist(&mut self, id: &str) -> Result<()> {
    if !self.playlists.delete(id) {
      return Err(LibraryError::NotFound(id.to_string()));
    }
    let in_watch_later = self.watch_later.remove(id);
    let in_history = self.history.remove(id);
    info!(id, in_watch_later, in_history, "library: playlist deleted");
    self.changed();
    Ok(())
  }

  // --- Watch later ---

  pub fn watch_later_ids(&self) -> &[String] {
    self.watch_later.ids()
  }

  pub fn is_in_watch_later(&self, playlist_id: &str) -> bool {
    self.watch_later.contains(playlist_id)
  }

  pub fn add_to_watch_later(&mut self, playlist_id: &str) -> Result<bool> {
    self.require(playlist_id)?;
    let added = self.watch_later.add(playlist_id);
    if added {
      self.changed();
    }
    Ok(added)
  }

  pub fn remove_from_watch_later(&mut self, playlist_id: &str) -> bool {
    let removed = self.watch_later.remove(playlist_id);
    if removed {
      self.changed();
    }
    removed
  }

  /// Flip membership; returns whether the playlist is now saved.
  pub fn toggle_watch_later(&mut self, playlist_id: &str) -> Result<bool> {
    if self.remove_from_watch_later(playlist_id) {
      return Ok(false);
    }
    self.add_to_watch_later(playlist_id)
  }

  // --- Continue watching ---

  pub fn history(&self) -> &[ContinueWatchingEntry] {
    self.history.entries()
  }

  pub fn history_entry(&self, playlist_id: &str) -> Option<&ContinueWatchingEntry> {
    self.history.get(playlist_id)
  }

  /// Record playback position for a playlist.
  pub fn add_to_history(&mut self, playlist_id: &str, video_index: usize) -> Result<()> {
    let len = self.require(playlist_id)?.videos.len();
    if video_index >= len {
      return Err(LibraryError::VideoOutOfRange { index: video_index, len });
    }
    self.history.add(playlist_id, video_index);
    self.changed();
    Ok(())
  }

  pub fn remove_from_history(&mut self, playlist_id: &str) -> bool {
    let removed = self.history.remove(playlist_id);
    if removed {
      self.changed();
    }
    removed
  }

  pub fn clear_history(&mut self) {
    self.history.clear();
    self.changed();
  }

  fn require(&self, id: &str) -> Result<&Playlist> {
    self.playlists.get(id).ok_or_else(|| LibraryError::NotFound(id.to_string()))
  }
}
