use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::constants::constants;

#[derive(Debug, Error)]
pub enum DiscordError {
  #[error("Discord request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Discord {endpoint} returned HTTP {status}")]
  Status { endpoint: String, status: u16 },

  #[error("invalid Discord URL: {0}")]
  Url(String),
}

/// OAuth application and bot credentials.
#[derive(Debug, Clone, Default)]
pub struct DiscordApp {
  pub client_id: String,
  pub client_secret: String,
  pub bot_token: String,
  pub guild_id: String,
  pub redirect_uri: String,
}

/// Who signed in, as seen from the guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordIdentity {
  pub user_id: String,
  pub name: String,
  pub image: String,
  pub email: Option<String>,
  pub roles: Vec<String>,
}

impl DiscordIdentity {
  pub fn has_role(&self, role_id: &str) -> bool {
    self.roles.iter().any(|r| r == role_id)
  }
}

/// The sign-in side of Discord: where to send the browser, and what a returned code means.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
  fn authorize_url(&self, state: &str) -> Result<String, DiscordError>;
  async fn identify(&self, code: &str) -> Result<DiscordIdentity, DiscordError>;
}

// --- Discord API resources ---

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
  pub id: String,
  pub username: String,
  #[serde(default)]
  pub global_name: Option<String>,
  #[serde(default)]
  pub avatar: Option<String>,
  #[serde(default)]
  pub discriminator: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
  #[serde(default)]
  pub nick: Option<String>,
  #[serde(default)]
  pub roles: Vec<String>,
  pub user: Option<DiscordUser>,
}

/// Guild nickname, then global display name, then username.
pub fn display_name(member_nick: Option<&str>, user: &DiscordUser) -> String {
  [member_nick, user.global_name.as_deref()]
    .into_iter()
    .flatten()
    .find(|n| !n.is_empty())
    .unwrap_or(&user.username)
    .to_string()
}

/// CDN avatar, or the default embed avatar picked by discriminator.
pub fn avatar_url(user: &DiscordUser) -> String {
  let cdn = &constants().discord_cdn_base;
  match user.avatar.as_deref().filter(|a| !a.is_empty()) {
    Some(hash) => format!("{}/avatars/{}/{}.png", cdn, user.id, hash),
    None => {
      let index = user.discriminator.as_deref().and_then(|d| d.parse::<u64>().ok()).unwrap_or(0) % 5;
      format!("{}/embed/avatars/{}.png", cdn, index)
    }
  }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct DiscordClient {
  http: Client,
  app: DiscordApp,
  api_base: String,
  authorize_base: String,
}

impl DiscordClient {
  pub fn new(app: DiscordApp) -> Self {
    let c = constants();
    Self::with_base(Client::new(), app, &c.discord_api_base, &c.discord_authorize_url)
  }

  pub fn with_base(http: Client, app: DiscordApp, api_base: &str, authorize_base: &str) -> Self {
    Self {
      http,
      app,
      api_base: api_base.trim_end_matches('/').to_string(),
      authorize_base: authorize_base.to_string(),
    }
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.api_base, path)
  }

  async fn read<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
  ) -> Result<T, DiscordError> {
    let status = response.status();
    if !status.is_success() {
      return Err(DiscordError::Status { endpoint: endpoint.to_string(), status: status.as_u16() });
    }
    Ok(response.json::<T>().await?)
  }

  /// Trade an authorization code for a user access token.
  pub async fn exchange_code(&self, code: &str) -> Result<String, DiscordError> {
    let form = [
      ("grant_type", "authorization_code"),
      ("code", code),
      ("redirect_uri", self.app.redirect_uri.as_str()),
      ("client_id", self.app.client_id.as_str()),
      ("client_secret", self.app.client_secret.as_str()),
    ];
    let response = self.http.post(self.endpoint("oauth2/token")).form(&form).send().await?;
    let token: TokenResponse = Self::read("oauth2/token", response).await?;
    Ok(token.access_token)
  }

  pub async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
    let response = self.http.get(self.endpoint("users/@me")).bearer_auth(access_token).send().await?;
    Self::read("users/@me", response).await
  }

  /// Guild membership, read with the bot token.
  pub async fn member(&self, user_id: &str) -> Result<GuildMember, DiscordError> {
    let path = format!("guilds/{}/members/{}", self.app.guild_id, user_id);
    let response = self
      .http
      .get(self.endpoint(&path))
      .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.app.bot_token))
      .send()
      .await?;
    Self::read("guilds/members", response).await
  }

  /// Role ids of a guild member. Lookup failures count as holding no roles.
  pub async fn member_roles(&self, user_id: &str) -> Vec<String> {
    match self.member(user_id).await {
      Ok(member) => member.roles,
      Err(e) => {
        error!(user_id, err = %e, "discord: failed to get member roles");
        Vec::new()
      }
    }
  }
}

#[async_trait]
impl IdentityProvider for DiscordClient {
  fn authorize_url(&self, state: &str) -> Result<String, DiscordError> {
    let url = Url::parse_with_params(
      &self.authorize_base,
      &[
        ("client_id", self.app.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", self.app.redirect_uri.as_str()),
        ("scope", constants().discord_scopes.as_str()),
        ("state", state),
      ],
    )
    .map_err(|e| DiscordError::Url(e.to_string()))?;
    Ok(url.to_string())
  }

  async fn identify(&self, code: &str) -> Result<DiscordIdentity, DiscordError> {
    let token = self.exchange_code(code).await?;
    let user = self.current_user(&token).await?;

    let (name, image, roles) = match self.member(&user.id).await {
      Ok(member) => {
        let profile = member.user.as_ref().unwrap_or(&user);
        (display_name(member.nick.as_deref(), profile), avatar_url(profile), member.roles)
      }
      Err(e) => {
        error!(user_id = %user.id, err = %e, "discord: failed to get member info");
        (display_name(None, &user), avatar_url(&user), Vec::new())
      }
    };
    debug!(user_id = %user.id, name = %name, roles = roles.len(), "discord: identified member");

    Ok(DiscordIdentity { user_id: user.id, name, image, email: user.email, roles })
  }
}
