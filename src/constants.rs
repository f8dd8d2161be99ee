//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  /// Fixed tag set shown as the semester filter row, in display order.
  pub semester_tags: Vec<String>,

  // Continue watching
  pub continue_watching_capacity: usize,

  // Persisted store namespaces
  pub playlist_storage_key: String,
  pub watch_later_storage_key: String,
  pub continue_watching_storage_key: String,
  pub storage_version: u32,

  // Route protection
  pub public_paths: Vec<String>,
  pub signin_path: String,
  pub error_path: String,
  pub unauthorized_path: String,
  pub admin_prefix: String,

  // YouTube Data API
  pub youtube_api_base: String,
  pub youtube_watch_base: String,
  pub youtube_page_size: usize,
  pub max_playlist_items: usize,
  pub duration_batch_size: usize,
  pub fetch_concurrency: usize,

  // Discord
  pub discord_api_base: String,
  pub discord_authorize_url: String,
  pub discord_cdn_base: String,
  pub discord_scopes: String,

  // Sessions
  pub session_cookie: String,
  pub state_cookie: String,
  pub session_ttl_hours: i64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test touching it fails.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
