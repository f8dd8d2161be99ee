use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::constants;

/// A single video inside a playlist. Only `title` is editable after fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
  pub id: String,
  pub title: String,
  /// YouTube duration string, e.g. `PT1H2M3S`.
  pub duration: String,
  pub thumbnail: String,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
  #[serde(default)]
  pub videos: Vec<Video>,
  #[serde(default)]
  pub tags: Vec<String>,
  pub is_draft: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// The YouTube playlist URL this was built from; empty for blank playlists.
  #[serde(rename = "youtubeUrl", default)]
  pub source_url: String,
}

impl Playlist {
  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.iter().any(|t| t == tag)
  }
}

/// Everything a caller supplies when creating a playlist; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlaylist {
  pub name: String,
  pub description: Option<String>,
  pub thumbnail: Option<String>,
  pub videos: Vec<Video>,
  pub tags: Vec<String>,
  pub is_draft: bool,
  pub source_url: String,
}

/// Partial update. `None` leaves a field as it is; the nested options on
/// `description`/`thumbnail` allow clearing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPatch {
  pub name: Option<String>,
  pub description: Option<Option<String>>,
  pub thumbnail: Option<Option<String>>,
  pub videos: Option<Vec<Video>>,
  pub tags: Option<Vec<String>>,
  pub is_draft: Option<bool>,
  pub source_url: Option<String>,
}

impl PlaylistPatch {
  pub fn draft(is_draft: bool) -> Self {
    Self { is_draft: Some(is_draft), ..Self::default() }
  }

  pub(crate) fn apply(self, playlist: &mut Playlist) {
    if let Some(name) = self.name {
      playlist.name = name;
    }
    if let Some(description) = self.description {
      playlist.description = description;
    }
    if let Some(thumbnail) = self.thumbnail {
      playlist.thumbnail = thumbnail;
    }
    if let Some(videos) = self.videos {
      playlist.videos = videos;
    }
    if let Some(tags) = self.tags {
      playlist.tags = normalize_tags(tags);
    }
    if let Some(is_draft) = self.is_draft {
      playlist.is_draft = is_draft;
    }
    if let Some(source_url) = self.source_url {
      playlist.source_url = source_url;
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatchingEntry {
  pub playlist_id: String,
  pub video_index: usize,
  pub last_watched: DateTime<Utc>,
}

// --- Tags ---

/// Tags compare equal ignoring case and surrounding whitespace.
pub fn same_tag(a: &str, b: &str) -> bool {
  a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Insert `tag` unless an equal tag (ignoring case) is already present.
/// Returns whether the tag was added.
pub fn insert_tag(tags: &mut Vec<String>, tag: &str) -> bool {
  let tag = tag.trim();
  if tag.is_empty() {
    return false;
  }
  if tags.iter().any(|t| same_tag(t, tag)) {
    return false;
  }
  tags.push(tag.to_string());
  true
}

/// Trim, drop empties, and deduplicate case-insensitively keeping the first spelling.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out = Vec::new();
  for tag in tags {
    insert_tag(&mut out, tag.as_ref());
  }
  out
}

/// Parse the editor's comma-separated tag field.
pub fn parse_tag_list(input: &str) -> Vec<String> {
  normalize_tags(input.split(','))
}

pub fn is_semester_tag(tag: &str) -> bool {
  constants().semester_tags.iter().any(|t| t == tag)
}
