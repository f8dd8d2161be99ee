//! Fakes and fixtures shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use coursedeck::auth::{RolePolicy, SessionService, SessionUser};
use coursedeck::discord::{DiscordError, DiscordIdentity, IdentityProvider};
use coursedeck::model::Video;
use coursedeck::server::{self, AppState, ServerOptions};
use coursedeck::youtube::{FetchError, FetchedPlaylist, PlaylistSource};
use std::sync::Arc;

pub const SECRET: &str = "test-secret";

/// Playlist source that either returns a fixed playlist or fails upstream.
pub struct FakeSource {
  pub playlist: Option<FetchedPlaylist>,
}

#[async_trait]
impl PlaylistSource for FakeSource {
  async fn fetch_playlist(&self, _url: &str) -> Result<FetchedPlaylist, FetchError> {
    self.playlist.clone().ok_or(FetchError::Status { endpoint: "playlistItems".into(), status: 403 })
  }
}

/// Identity provider that recognises the code "good" as a member with `roles`.
pub struct FakeIdentity {
  pub roles: Vec<String>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
  fn authorize_url(&self, state: &str) -> Result<String, DiscordError> {
    Ok(format!("https://discord.test/oauth2/authorize?state={}", state))
  }

  async fn identify(&self, code: &str) -> Result<DiscordIdentity, DiscordError> {
    if code != "good" {
      return Err(DiscordError::Status { endpoint: "oauth2/token".into(), status: 400 });
    }
    Ok(DiscordIdentity {
      user_id: "1001".into(),
      name: "Ada".into(),
      image: "https://cdn.discordapp.com/embed/avatars/1.png".into(),
      email: None,
      roles: self.roles.clone(),
    })
  }
}

pub fn sample_playlist() -> FetchedPlaylist {
  FetchedPlaylist {
    name: "Discrete Maths".into(),
    description: "Lecture series".into(),
    videos: vec![Video {
      id: "abc".into(),
      title: "Sets".into(),
      duration: "PT12M5S".into(),
      thumbnail: "https://i.ytimg.com/vi/abc/mqdefault.jpg".into(),
      url: "https://youtube.com/watch?v=abc".into(),
    }],
  }
}

pub fn policy() -> RolePolicy {
  RolePolicy { required_role_id: "member".into(), admin_role_id: "admin".into() }
}

pub fn app_with(source: FakeSource, roles: &[&str], options: ServerOptions) -> Router {
  let state = AppState::new(
    Arc::new(source),
    Arc::new(FakeIdentity { roles: roles.iter().map(|r| r.to_string()).collect() }),
    SessionService::new(SECRET, 1),
    policy(),
    options,
  );
  server::router(state)
}

pub fn app(source: FakeSource) -> Router {
  app_with(source, &["member"], ServerOptions::default())
}

/// `Cookie` header value for a signed-in user.
pub fn session_cookie(is_admin: bool) -> String {
  let user = SessionUser { id: "1001".into(), name: "Ada".into(), image: String::new(), is_admin };
  let token = SessionService::new(SECRET, 1).issue(&user).unwrap();
  format!("coursedeck_session={}", token)
}
