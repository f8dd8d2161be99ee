use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::model::{NewPlaylist, Video};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("Missing playlist URL")]
  MissingUrl,

  #[error("Invalid playlist URL")]
  InvalidUrl,

  #[error("YouTube API key is not configured")]
  MissingApiKey,

  #[error("YouTube request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("YouTube {endpoint} returned HTTP {status}")]
  Status { endpoint: String, status: u16 },
}

impl FetchError {
  /// Whether the caller supplied a bad URL, as opposed to an upstream failure.
  pub fn is_bad_request(&self) -> bool {
    matches!(self, FetchError::MissingUrl | FetchError::InvalidUrl)
  }
}

/// Normalized result of reading a YouTube playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPlaylist {
  pub name: String,
  pub description: String,
  pub videos: Vec<Video>,
}

impl FetchedPlaylist {
  pub fn into_new_playlist(self, source_url: &str, is_draft: bool) -> NewPlaylist {
    NewPlaylist {
      name: self.name,
      description: Some(self.description).filter(|d| !d.is_empty()),
      thumbnail: None,
      videos: self.videos,
      tags: Vec::new(),
      is_draft,
      source_url: source_url.to_string(),
    }
  }
}

/// Anything that can turn a playlist URL into videos.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
  async fn fetch_playlist(&self, url: &str) -> Result<FetchedPlaylist, FetchError>;
}

static LIST_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"list=([^&]*)").expect("list pattern is valid"));

/// The `list=` value of a playlist URL, if present and non-empty.
pub fn extract_playlist_id(url: &str) -> Option<&str> {
  LIST_PARAM.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str()).filter(|id| !id.is_empty())
}

pub fn watch_url(video_id: &str) -> String {
  format!("{}{}", constants().youtube_watch_base, video_id)
}

// --- YouTube Data API v3 resources (only the fields we read) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
  #[serde(default = "Vec::new")]
  items: Vec<T>,
  next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
  snippet: Option<PlaylistSnippet>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
  title: Option<String>,
  description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
  content_details: Option<ItemContentDetails>,
  snippet: Option<ItemSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemContentDetails {
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemSnippet {
  title: Option<String>,
  thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
  medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
  url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
  id: Option<String>,
  content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
  duration: Option<String>,
}

/// A playlist item that carried a video id.
struct ItemStub {
  video_id: String,
  title: String,
  thumbnail: String,
}

impl PlaylistItemResource {
  fn into_stub(self) -> Option<ItemStub> {
    let video_id = self.content_details.and_then(|c| c.video_id).filter(|id| !id.trim().is_empty())?;
    let (title, thumbnail) = match self.snippet {
      Some(s) => {
        let thumbnail = s.thumbnails.and_then(|t| t.medium).and_then(|m| m.url).unwrap_or_default();
        (s.title.unwrap_or_default(), thumbnail)
      }
      None => (String::new(), String::new()),
    };
    Some(ItemStub { video_id, title, thumbnail })
  }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct YoutubeClient {
  http: Client,
  api_base: String,
  api_key: Option<String>,
}

impl YoutubeClient {
  pub fn new(api_key: Option<String>) -> Self {
    Self::with_base(Client::new(), &constants().youtube_api_base, api_key)
  }

  pub fn with_base(http: Client, api_base: &str, api_key: Option<String>) -> Self {
    Self { http, api_base: api_base.trim_end_matches('/').to_string(), api_key }
  }

  async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T, FetchError> {
    let key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
    let url = format!("{}/{}", self.api_base, endpoint);
    let response = self.http.get(&url).query(query).query(&[("key", key)]).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      warn!(endpoint, status = status.as_u16(), body = %body, "youtube: request rejected");
      return Err(FetchError::Status { endpoint: endpoint.to_string(), status: status.as_u16() });
    }
    Ok(response.json::<T>().await?)
  }

  async fn playlist_items(&self, playlist_id: &str) -> Result<Vec<PlaylistItemResource>, FetchError> {
    let c = constants();
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
      let max_results = c.youtube_page_size.min(c.max_playlist_items - items.len()).to_string();
      let mut query =
        vec![("part", "snippet,contentDetails"), ("playlistId", playlist_id), ("maxResults", max_results.as_str())];
      if let Some(token) = page_token.as_deref() {
        query.push(("pageToken", token));
      }
      let page: ListResponse<PlaylistItemResource> = self.get("playlistItems", &query).await?;
      items.extend(page.items);
      match page.next_page_token {
        Some(token) if items.len() < c.max_playlist_items => page_token = Some(token),
        _ => break,
      }
    }
    items.truncate(c.max_playlist_items);
    Ok(items)
  }

  /// Video id → duration, looked up in batches that run with bounded concurrency.
  async fn video_durations(&self, ids: &[String]) -> Result<HashMap<String, String>, FetchError> {
    let c = constants();
    let batches: Vec<String> = ids.chunks(c.duration_batch_size.max(1)).map(|batch| batch.join(",")).collect();
    let pages: Vec<ListResponse<VideoResource>> = stream::iter(batches)
      .map(|joined: String| async move {
        self.get::<ListResponse<VideoResource>>("videos", &[("part", "contentDetails"), ("id", joined.as_str())]).await
      })
      .buffered(c.fetch_concurrency.max(1))
      .try_collect()
      .await?;

    Ok(
      pages
        .into_iter()
        .flat_map(|page| page.items)
        .filter_map(|v| Some((v.id?, v.content_details.and_then(|d| d.duration).unwrap_or_default())))
        .collect(),
    )
  }
}

#[async_trait]
impl PlaylistSource for YoutubeClient {
  async fn fetch_playlist(&self, url: &str) -> Result<FetchedPlaylist, FetchError> {
    if url.trim().is_empty() {
      return Err(FetchError::MissingUrl);
    }
    let playlist_id = extract_playlist_id(url).ok_or(FetchError::InvalidUrl)?;
    info!(playlist_id, "youtube: fetching playlist");

    let meta: ListResponse<PlaylistResource> =
      self.get("playlists", &[("part", "snippet"), ("id", playlist_id)]).await?;
    let snippet = meta.items.into_iter().next().and_then(|p| p.snippet);

    let stubs: Vec<ItemStub> =
      self.playlist_items(playlist_id).await?.into_iter().filter_map(PlaylistItemResource::into_stub).collect();
    let ids: Vec<String> = stubs.iter().map(|s| s.video_id.clone()).collect();
    let mut durations = self.video_durations(&ids).await?;
    debug!(playlist_id, videos = stubs.len(), "youtube: resolved durations");

    let videos = stubs
      .into_iter()
      .map(|s| Video {
        duration: durations.remove(&s.video_id).unwrap_or_default(),
        url: watch_url(&s.video_id),
        id: s.video_id,
        title: s.title,
        thumbnail: s.thumbnail,
      })
      .collect();

    let (name, description) = match snippet {
      Some(s) => (s.title.unwrap_or_default(), s.description.unwrap_or_default()),
      None => (String::new(), String::new()),
    };
    Ok(FetchedPlaylist { name, description, videos })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extract_playlist_id_from_common_urls() {
    assert_eq!(extract_playlist_id("https://www.youtube.com/playlist?list=PLabc123"), Some("PLabc123"));
    assert_eq!(extract_playlist_id("https://youtube.com/watch?v=xyz&list=PLdef&index=2"), Some("PLdef"));
  }

  #[test]
  fn extract_playlist_id_rejects_missing_or_empty() {
    assert_eq!(extract_playlist_id("https://youtube.com/watch?v=xyz"), None);
    assert_eq!(extract_playlist_id("https://youtube.com/playlist?list=&x=1"), None);
    assert_eq!(extract_playlist_id(""), None);
  }

  #[test]
  fn watch_url_format() {
    assert_eq!(watch_url("abc"), "https://youtube.com/watch?v=abc");
  }

  #[test]
  fn item_without_video_id_is_dropped() {
    let item: PlaylistItemResource = serde_json::from_value(serde_json::json!({
      "snippet": { "title": "Deleted video" }
    }))
    .unwrap();
    assert!(item.into_stub().is_none());
  }

  #[test]
  fn item_defaults_missing_strings() {
    let item: PlaylistItemResource = serde_json::from_value(serde_json::json!({
      "contentDetails": { "videoId": "v1" }
    }))
    .unwrap();
    let stub = item.into_stub().unwrap();
    assert_eq!(stub.video_id, "v1");
    assert_eq!(stub.title, "");
    assert_eq!(stub.thumbnail, "");
  }

  #[test]
  fn into_new_playlist_drops_empty_description() {
    let fetched = FetchedPlaylist { name: "N".into(), description: String::new(), videos: Vec::new() };
    let new = fetched.into_new_playlist("https://youtube.com/playlist?list=PL1", true);
    assert!(new.is_draft);
    assert_eq!(new.description, None);
    assert_eq!(new.source_url, "https://youtube.com/playlist?list=PL1");
  }

  #[tokio::test]
  async fn fetch_without_key_fails_before_network() {
    let client = YoutubeClient::new(None);
    let err = client.fetch_playlist("https://youtube.com/playlist?list=PL1").await.unwrap_err();
    assert!(matches!(err, FetchError::MissingApiKey));
  }

  #[tokio::test]
  async fn fetch_rejects_bad_urls() {
    let client = YoutubeClient::new(Some("key".into()));
    assert!(matches!(client.fetch_playlist("  ").await, Err(FetchError::MissingUrl)));
    assert!(matches!(client.fetch_playlist("https://youtube.com/watch?v=1").await, Err(FetchError::InvalidUrl)));
  }
}
