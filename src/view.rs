//! Derived, read-only listings over the playlist collection.
//!
//! Nothing here mutates. Public views never include drafts; only
//! [`admin_listing`] can show them.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

use crate::constants::constants;
use crate::model::{ContinueWatchingEntry, Playlist, is_semester_tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftFilter {
  #[default]
  All,
  Drafts,
  Published,
}

impl DraftFilter {
  fn admits(self, playlist: &Playlist) -> bool {
    match self {
      DraftFilter::All => true,
      DraftFilter::Drafts => playlist.is_draft,
      DraftFilter::Published => !playlist.is_draft,
    }
  }
}

impl FromStr for DraftFilter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "all" => Ok(DraftFilter::All),
      "drafts" | "draft" => Ok(DraftFilter::Drafts),
      "published" => Ok(DraftFilter::Published),
      other => Err(format!("unknown draft filter '{}' (expected all, drafts or published)", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  NameAsc,
  NameDesc,
  #[default]
  UpdatedDesc,
  UpdatedAsc,
  VideosDesc,
  VideosAsc,
}

impl SortKey {
  pub const ALL: [SortKey; 6] = [
    SortKey::NameAsc,
    SortKey::NameDesc,
    SortKey::UpdatedDesc,
    SortKey::UpdatedAsc,
    SortKey::VideosDesc,
    SortKey::VideosAsc,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      SortKey::NameAsc => "name-asc",
      SortKey::NameDesc => "name-desc",
      SortKey::UpdatedDesc => "date-desc",
      SortKey::UpdatedAsc => "date-asc",
      SortKey::VideosDesc => "videos-desc",
      SortKey::VideosAsc => "videos-asc",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortKey::NameAsc => "Name (A-Z)",
      SortKey::NameDesc => "Name (Z-A)",
      SortKey::UpdatedDesc => "Newest First",
      SortKey::UpdatedAsc => "Oldest First",
      SortKey::VideosDesc => "Most Videos",
      SortKey::VideosAsc => "Fewest Videos",
    }
  }

  fn compare(self, a: &Playlist, b: &Playlist) -> Ordering {
    match self {
      SortKey::NameAsc => locale_cmp(&a.name, &b.name),
      SortKey::NameDesc => locale_cmp(&b.name, &a.name),
      SortKey::UpdatedDesc => b.updated_at.cmp(&a.updated_at),
      SortKey::UpdatedAsc => a.updated_at.cmp(&b.updated_at),
      SortKey::VideosDesc => b.videos.len().cmp(&a.videos.len()),
      SortKey::VideosAsc => a.videos.len().cmp(&b.videos.len()),
    }
  }
}

impl fmt::Display for SortKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortKey {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    SortKey::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| {
        let known: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown sort key '{}' (expected one of {})", s, known.join(", "))
      })
  }
}

/// Case-folded comparison with a byte-order tiebreak, so "apple" sorts beside "Apple".
fn locale_cmp(a: &str, b: &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Filter state of the admin playlist page.
#[derive(Debug, Clone, Default)]
pub struct AdminQuery {
  pub search: String,
  pub tag: Option<String>,
  pub drafts: DraftFilter,
  pub sort: SortKey,
}

/// Case-insensitive substring match on name, description, or any tag. Blank matches everything.
pub fn matches_search(playlist: &Playlist, query: &str) -> bool {
  let query = query.trim();
  if query.is_empty() {
    return true;
  }
  let needle = query.to_lowercase();
  playlist.name.to_lowercase().contains(&needle)
    || playlist.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&needle))
    || playlist.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

fn matches_tag(playlist: &Playlist, tag: Option<&str>) -> bool {
  tag.is_none_or(|t| playlist.has_tag(t))
}

/// Home feed: published playlists matching the search and the selected tag, in storage order.
pub fn public_feed<'a>(playlists: &'a [Playlist], search: &str, tag: Option<&str>) -> Vec<&'a Playlist> {
  playlists.iter().filter(|p| !p.is_draft && matches_search(p, search) && matches_tag(p, tag)).collect()
}

/// Admin listing: every playlist, filtered by search, draft state and tag, then sorted.
pub fn admin_listing<'a>(playlists: &'a [Playlist], query: &AdminQuery) -> Vec<&'a Playlist> {
  let mut out: Vec<&Playlist> = playlists
    .iter()
    .filter(|p| matches_search(p, &query.search) && query.drafts.admits(p) && matches_tag(p, query.tag.as_deref()))
    .collect();
  out.sort_by(|a, b| query.sort.compare(a, b));
  out
}

/// Watch page lookup; drafts are invisible here.
pub fn find_public<'a>(playlists: &'a [Playlist], id: &str) -> Option<&'a Playlist> {
  playlists.iter().find(|p| p.id == id && !p.is_draft)
}

#[derive(Debug, Clone)]
pub struct ContinueWatchingItem<'a> {
  pub playlist: &'a Playlist,
  pub entry: &'a ContinueWatchingEntry,
}

impl ContinueWatchingItem<'_> {
  /// Fraction of the playlist reached, in `0.0..=1.0`.
  pub fn progress(&self) -> f64 {
    let len = self.playlist.videos.len();
    if len == 0 { 0.0 } else { (self.entry.video_index as f64 / len as f64).min(1.0) }
  }
}

/// Published playlists with history, most recently watched first.
pub fn continue_watching<'a>(
  playlists: &'a [Playlist],
  entries: &'a [ContinueWatchingEntry],
) -> Vec<ContinueWatchingItem<'a>> {
  let mut items: Vec<(usize, ContinueWatchingItem<'a>)> = playlists
    .iter()
    .filter(|p| !p.is_draft)
    .filter_map(|playlist| {
      let (pos, entry) = entries.iter().enumerate().find(|(_, e)| e.playlist_id == playlist.id)?;
      Some((pos, ContinueWatchingItem { playlist, entry }))
    })
    .collect();
  items.sort_by_key(|(pos, item)| (Reverse(item.entry.last_watched), *pos));
  items.into_iter().map(|(_, item)| item).collect()
}

/// Published playlists saved for later, in playlist storage order.
pub fn watch_later<'a>(playlists: &'a [Playlist], ids: &[String]) -> Vec<&'a Playlist> {
  playlists.iter().filter(|p| !p.is_draft && ids.iter().any(|id| *id == p.id)).collect()
}

/// Tags for the filter row, split into the fixed semester set and everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroups {
  /// Semester tags in canonical order that appear on at least one published playlist.
  pub semester: Vec<String>,
  /// Remaining tags on published playlists, sorted case-insensitively.
  pub custom: Vec<String>,
}

pub fn tag_groups(playlists: &[Playlist]) -> TagGroups {
  let published: Vec<&Playlist> = playlists.iter().filter(|p| !p.is_draft).collect();
  let semester =
    constants().semester_tags.iter().filter(|tag| published.iter().any(|p| p.has_tag(tag))).cloned().collect();
  let mut custom: Vec<String> = Vec::new();
  for tag in published.iter().flat_map(|p| p.tags.iter()) {
    if !is_semester_tag(tag) && !custom.contains(tag) {
      custom.push(tag.clone());
    }
  }
  custom.sort_by(|a, b| locale_cmp(a, b));
  TagGroups { semester, custom }
}
