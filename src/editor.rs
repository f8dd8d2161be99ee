//! Draft/publish lifecycle of a single playlist.
//!
//! A [`PlaylistEditor`] keeps an edit buffer next to the snapshot that was last
//! persisted. The buffer is dirty whenever the two differ. Persisting always goes
//! through the [`Library`], so the delete cascade and change notifications apply.

use tracing::{info, warn};

use crate::library::{Library, LibraryError, Result};
use crate::model::{NewPlaylist, Playlist, PlaylistPatch, Video, insert_tag, normalize_tags, parse_tag_list, same_tag};
use crate::youtube::{FetchedPlaylist, PlaylistSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistState {
  Draft,
  Published,
}

impl PlaylistState {
  pub fn from_is_draft(is_draft: bool) -> Self {
    if is_draft { PlaylistState::Draft } else { PlaylistState::Published }
  }

  pub fn label(self) -> &'static str {
    match self {
      PlaylistState::Draft => "draft",
      PlaylistState::Published => "published",
    }
  }
}

/// Editable fields of a playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
  pub name: String,
  pub description: String,
  pub thumbnail: Option<String>,
  pub videos: Vec<Video>,
  pub tags: Vec<String>,
  pub source_url: String,
}

impl EditBuffer {
  fn from_playlist(playlist: &Playlist) -> Self {
    Self {
      name: playlist.name.clone(),
      description: playlist.description.clone().unwrap_or_default(),
      thumbnail: playlist.thumbnail.clone(),
      videos: playlist.videos.clone(),
      tags: playlist.tags.clone(),
      source_url: playlist.source_url.clone(),
    }
  }

  fn description(&self) -> Option<String> {
    Some(self.description.clone()).filter(|d| !d.trim().is_empty())
  }

  fn to_new(&self, is_draft: bool) -> NewPlaylist {
    NewPlaylist {
      name: self.name.clone(),
      description: self.description(),
      thumbnail: self.thumbnail.clone(),
      videos: self.videos.clone(),
      tags: self.tags.clone(),
      is_draft,
      source_url: self.source_url.clone(),
    }
  }

  fn to_patch(&self, is_draft: bool) -> PlaylistPatch {
    PlaylistPatch {
      name: Some(self.name.clone()),
      description: Some(self.description()),
      thumbnail: Some(self.thumbnail.clone()),
      videos: Some(self.videos.clone()),
      tags: Some(self.tags.clone()),
      is_draft: Some(is_draft),
      source_url: Some(self.source_url.clone()),
    }
  }

  /// Fold a fresh fetch into the buffer: the video list follows the source,
  /// but titles the user already edited are kept.
  fn merge_fetched(&mut self, fetched: FetchedPlaylist) {
    let videos = fetched
      .videos
      .into_iter()
      .map(|mut video| {
        if let Some(existing) = self.videos.iter().find(|v| v.id == video.id) {
          video.title = existing.title.clone();
        }
        video
      })
      .collect();
    self.videos = videos;
    if !fetched.name.trim().is_empty() {
      self.name = fetched.name;
    }
    if !fetched.description.trim().is_empty() {
      self.description = fetched.description;
    }
  }
}

#[derive(Debug, Clone)]
struct Saved {
  id: String,
  state: PlaylistState,
}

pub struct PlaylistEditor {
  saved: Option<Saved>,
  buffer: EditBuffer,
  snapshot: EditBuffer,
}

impl PlaylistEditor {
  /// Start a blank, unsaved playlist.
  pub fn new_blank() -> Self {
    Self { saved: None, buffer: EditBuffer::default(), snapshot: EditBuffer::default() }
  }

  /// Start an unsaved playlist from a YouTube playlist URL.
  pub async fn from_source(source: &dyn PlaylistSource, url: &str) -> Result<Self> {
    let fetched = source.fetch_playlist(url).await?;
    let mut editor = Self::new_blank();
    editor.buffer.source_url = url.to_string();
    editor.buffer.merge_fetched(fetched);
    Ok(editor)
  }

  /// Open an existing playlist for editing.
  pub fn open(library: &Library, id: &str) -> Result<Self> {
    let playlist = library.playlist(id).ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
    let buffer = EditBuffer::from_playlist(playlist);
    Ok(Self {
      saved: Some(Saved { id: playlist.id.clone(), state: PlaylistState::from_is_draft(playlist.is_draft) }),
      snapshot: buffer.clone(),
      buffer,
    })
  }

  pub fn id(&self) -> Option<&str> {
    self.saved.as_ref().map(|s| s.id.as_str())
  }

  /// `None` until the playlist has been saved once.
  pub fn state(&self) -> Option<PlaylistState> {
    self.saved.as_ref().map(|s| s.state)
  }

  pub fn buffer(&self) -> &EditBuffer {
    &self.buffer
  }

  /// Unsaved edits exist. A never-saved playlist counts as dirty once anything is filled in.
  pub fn is_dirty(&self) -> bool {
    self.buffer != self.snapshot
  }

  /// Unpublish is only offered on a clean, published playlist.
  pub fn can_unpublish(&self) -> bool {
    self.state() == Some(PlaylistState::Published) && !self.is_dirty()
  }

  // --- Buffer edits ---

  pub fn set_name(&mut self, name: &str) {
    self.buffer.name = name.to_string();
  }

  pub fn set_description(&mut self, description: &str) {
    self.buffer.description = description.to_string();
  }

  pub fn set_thumbnail(&mut self, thumbnail: Option<&str>) {
    self.buffer.thumbnail = thumbnail.map(str::to_string).filter(|t| !t.trim().is_empty());
  }

  pub fn set_source_url(&mut self, url: &str) {
    self.buffer.source_url = url.trim().to_string();
  }

  /// Replace all tags from the comma-separated tag field.
  pub fn set_tags_csv(&mut self, input: &str) {
    self.buffer.tags = parse_tag_list(input);
  }

  pub fn set_tags(&mut self, tags: &[String]) {
    self.buffer.tags = normalize_tags(tags);
  }

  pub fn add_tag(&mut self, tag: &str) -> bool {
    insert_tag(&mut self.buffer.tags, tag)
  }

  pub fn remove_tag(&mut self, tag: &str) -> bool {
    let before = self.buffer.tags.len();
    self.buffer.tags.retain(|t| !same_tag(t, tag));
    self.buffer.tags.len() != before
  }

  pub fn rename_video(&mut self, video_id: &str, title: &str) -> bool {
    match self.buffer.videos.iter_mut().find(|v| v.id == video_id) {
      Some(video) => {
        video.title = title.to_string();
        true
      }
      None => false,
    }
  }

  pub fn remove_video(&mut self, video_id: &str) -> bool {
    let before = self.buffer.videos.len();
    self.buffer.videos.retain(|v| v.id != video_id);
    self.buffer.videos.len() != before
  }

  /// Move the video at `from` so it ends up at `to`. Out-of-range indices leave the order alone.
  pub fn move_video(&mut self, from: usize, to: usize) -> bool {
    let len = self.buffer.videos.len();
    if from >= len || to >= len {
      return false;
    }
    let video = self.buffer.videos.remove(from);
    self.buffer.videos.insert(to, video);
    true
  }

  /// Drop unsaved edits.
  pub fn revert(&mut self) {
    self.buffer = self.snapshot.clone();
  }

  // --- Lifecycle ---

  /// "Save Draft": create as draft, or save edits to an existing draft.
  pub fn save_draft(&mut self, library: &mut Library) -> Result<String> {
    match self.saved.clone() {
      None => Ok(self.create(library, PlaylistState::Draft)),
      Some(Saved { id, state: PlaylistState::Draft }) => {
        self.write(library, &id, PlaylistState::Draft)?;
        Ok(id)
      }
      Some(Saved { state: PlaylistState::Published, .. }) => {
        Err(LibraryError::InvalidTransition { action: "save as draft", state: "published" })
      }
    }
  }

  /// "Publish" for new playlists and drafts, "Publish Changes" for published ones.
  pub fn publish(&mut self, library: &mut Library) -> Result<String> {
    match self.saved.clone() {
      None => Ok(self.create(library, PlaylistState::Published)),
      Some(Saved { id, state: PlaylistState::Draft }) => {
        self.write(library, &id, PlaylistState::Published)?;
        info!(id = %id, "editor: draft published");
        Ok(id)
      }
      Some(Saved { id, state: PlaylistState::Published }) => {
        if self.is_dirty() {
          self.write(library, &id, PlaylistState::Published)?;
          info!(id = %id, "editor: published changes");
        }
        Ok(id)
      }
    }
  }

  /// Return a published playlist to draft. Refused while edits are pending.
  pub fn unpublish(&mut self, library: &mut Library) -> Result<()> {
    let Some(Saved { id, state }) = self.saved.clone() else {
      return Err(LibraryError::InvalidTransition { action: "unpublish", state: "unsaved" });
    };
    if state != PlaylistState::Published {
      return Err(LibraryError::InvalidTransition { action: "unpublish", state: state.label() });
    }
    if self.is_dirty() {
      return Err(LibraryError::UnsavedChanges);
    }
    library.update_playlist(&id, PlaylistPatch::draft(true))?;
    self.saved = Some(Saved { id: id.clone(), state: PlaylistState::Draft });
    info!(id = %id, "editor: unpublished");
    Ok(())
  }

  /// "Discard Draft": delete a draft permanently, or drop an unsaved buffer.
  pub fn discard_draft(self, library: &mut Library) -> Result<()> {
    match self.saved {
      None => Ok(()),
      Some(Saved { id, state: PlaylistState::Draft }) => {
        library.delete_playlist(&id)?;
        info!(id = %id, "editor: draft discarded");
        Ok(())
      }
      Some(Saved { state: PlaylistState::Published, .. }) => {
        Err(LibraryError::InvalidTransition { action: "discard", state: "published" })
      }
    }
  }

  /// "Delete Playlist": delete a published playlist permanently.
  pub fn delete(self, library: &mut Library) -> Result<()> {
    match self.saved {
      Some(Saved { id, state: PlaylistState::Published }) => {
        library.delete_playlist(&id)?;
        info!(id = %id, "editor: playlist deleted");
        Ok(())
      }
      Some(Saved { state: PlaylistState::Draft, .. }) => {
        Err(LibraryError::InvalidTransition { action: "delete", state: "draft" })
      }
      None => Err(LibraryError::InvalidTransition { action: "delete", state: "unsaved" }),
    }
  }

  /// Re-fetch the source playlist into the buffer. Nothing is persisted and the
  /// draft/published state is untouched; on failure the buffer is unchanged.
  pub async fn refresh(&mut self, source: &dyn PlaylistSource) -> Result<()> {
    if self.buffer.source_url.trim().is_empty() {
      return Err(LibraryError::NoSourceUrl);
    }
    match source.fetch_playlist(&self.buffer.source_url).await {
      Ok(fetched) => {
        self.buffer.merge_fetched(fetched);
        Ok(())
      }
      Err(e) => {
        warn!(url = %self.buffer.source_url, err = %e, "editor: refresh failed");
        Err(e.into())
      }
    }
  }

  fn create(&mut self, library: &mut Library, state: PlaylistState) -> String {
    let id = library.create_playlist(self.buffer.to_new(state == PlaylistState::Draft));
    info!(id = %id, state = state.label(), "editor: playlist created");
    self.saved = Some(Saved { id: id.clone(), state });
    self.snapshot = self.buffer.clone();
    id
  }

  fn write(&mut self, library: &mut Library, id: &str, state: PlaylistState) -> Result<()> {
    let stored = library.update_playlist(id, self.buffer.to_patch(state == PlaylistState::Draft))?;
    self.buffer = EditBuffer::from_playlist(stored);
    self.snapshot = self.buffer.clone();
    self.saved = Some(Saved { id: id.to_string(), state });
    Ok(())
  }
}
