//! Plain-text views for the command line.

use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::duration::{calculate_total_duration, format_duration};
use crate::model::Playlist;
use crate::view::{ContinueWatchingItem, TagGroups};

const NAME_WIDTH: usize = 36;
const TITLE_WIDTH: usize = 48;

/// Truncate to `max_width` display columns, appending "…" if truncated.
pub fn truncate(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    out.push(c);
    used += w;
  }
  out.push('…');
  out
}

/// Left-align in `width` display columns, truncating as needed.
pub fn pad(s: &str, width: usize) -> String {
  let cell = truncate(s, width);
  let fill = width.saturating_sub(cell.width());
  format!("{}{}", cell, " ".repeat(fill))
}

fn status(playlist: &Playlist) -> &'static str {
  if playlist.is_draft { "draft" } else { "published" }
}

/// One line per playlist: id, name, video count, total length, tags.
pub fn playlist_table(playlists: &[&Playlist], show_status: bool) -> String {
  if playlists.is_empty() {
    return "No playlists.\n".to_string();
  }
  let mut out = String::new();
  for p in playlists {
    let _ = write!(
      out,
      "{}  {}  {:>3} videos  {:>8}",
      p.id.chars().take(8).collect::<String>(),
      pad(&p.name, NAME_WIDTH),
      p.videos.len(),
      calculate_total_duration(&p.videos)
    );
    if show_status {
      let _ = write!(out, "  {:<9}", status(p));
    }
    if !p.tags.is_empty() {
      let _ = write!(out, "  [{}]", p.tags.join(", "));
    }
    out.push('\n');
  }
  out
}

pub fn playlist_detail(playlist: &Playlist) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{} ({})", playlist.name, status(playlist));
  let _ = writeln!(out, "id:       {}", playlist.id);
  if let Some(description) = &playlist.description {
    let _ = writeln!(out, "about:    {}", description);
  }
  if !playlist.source_url.is_empty() {
    let _ = writeln!(out, "source:   {}", playlist.source_url);
  }
  if !playlist.tags.is_empty() {
    let _ = writeln!(out, "tags:     {}", playlist.tags.join(", "));
  }
  let _ = writeln!(out, "updated:  {}", playlist.updated_at.format("%Y-%m-%d %H:%M"));
  let _ = writeln!(out, "length:   {} in {} videos", calculate_total_duration(&playlist.videos), playlist.videos.len());
  for (i, video) in playlist.videos.iter().enumerate() {
    let title = pad(&video.title, TITLE_WIDTH);
    let _ = writeln!(out, "{:>3}. {}  {:>8}  {}", i + 1, title, format_duration(&video.duration), video.id);
  }
  out
}

pub fn continue_watching(items: &[ContinueWatchingItem<'_>]) -> String {
  if items.is_empty() {
    return "Nothing in progress.\n".to_string();
  }
  let mut out = String::new();
  for item in items {
    let _ = writeln!(
      out,
      "{}  video {:>2}/{:<2}  {:>3.0}%  {}",
      pad(&item.playlist.name, NAME_WIDTH),
      item.entry.video_index + 1,
      item.playlist.videos.len(),
      item.progress() * 100.0,
      item.entry.last_watched.format("%Y-%m-%d %H:%M")
    );
  }
  out
}

pub fn tag_groups(groups: &TagGroups) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "semester: {}", groups.semester.join("  "));
  if !groups.custom.is_empty() {
    let _ = writeln!(out, "tags:     {}", groups.custom.join("  "));
  }
  out
}
