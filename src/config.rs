use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::RolePolicy;
use crate::constants::constants;
use crate::discord::DiscordApp;

/// Longest session lifetime `serve` accepts: five years.
pub const MAX_SESSION_TTL_HOURS: i64 = 5 * 366 * 24;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("missing setting {0}")]
  Missing(&'static str),

  #[error("setting {setting} must be {expected}")]
  Invalid { setting: &'static str, expected: String },

  #[error("no home directory to derive {0} from")]
  NoProjectDirs(&'static str),
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "coursedeck")
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub server: ServerSettings,
  pub youtube: YoutubeSettings,
  pub discord: DiscordSettings,
  pub session: SessionSettings,
  pub storage: StorageSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
  pub host: String,
  pub port: u16,
  /// Externally visible origin, used for the OAuth redirect URI.
  pub public_url: Option<String>,
  /// Prebuilt web UI served for unrouted paths.
  pub web_dir: Option<PathBuf>,
  pub require_auth: bool,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self { host: "127.0.0.1".to_string(), port: 3000, public_url: None, web_dir: None, require_auth: true }
  }
}

impl ServerSettings {
  pub fn public_url(&self) -> String {
    match &self.public_url {
      Some(url) => url.trim_end_matches('/').to_string(),
      None => format!("http://{}:{}", self.host, self.port),
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct YoutubeSettings {
  pub api_key: Option<String>,
  pub api_base: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DiscordSettings {
  pub client_id: String,
  pub client_secret: String,
  pub bot_token: String,
  pub guild_id: String,
  pub required_role_id: String,
  pub admin_role_id: String,
  pub api_base: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionSettings {
  pub secret: String,
  pub ttl_hours: i64,
}

impl Default for SessionSettings {
  fn default() -> Self {
    Self { secret: String::new(), ttl_hours: constants().session_ttl_hours }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StorageSettings {
  pub data_dir: Option<PathBuf>,
}

impl Config {
  pub fn default_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
  }

  /// Read `path` (or the default location) and apply environment overrides.
  /// A missing file yields defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = path.map(Path::to_path_buf).or_else(Self::default_path);
    let mut config = match path {
      Some(path) if path.exists() => Self::from_file(&path)?,
      _ => Self::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content =
      std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
    let set = |target: &mut String, key: &str| {
      if let Some(value) = var(key) {
        *target = value;
      }
    };
    set(&mut self.discord.client_id, "DISCORD_CLIENT_ID");
    set(&mut self.discord.client_secret, "DISCORD_CLIENT_SECRET");
    set(&mut self.discord.bot_token, "DISCORD_BOT_TOKEN");
    set(&mut self.discord.guild_id, "DISCORD_SERVER_ID");
    set(&mut self.discord.required_role_id, "DISCORD_REQUIRED_ROLE_ID");
    set(&mut self.discord.admin_role_id, "DISCORD_ADMIN_ROLE_ID");
    set(&mut self.session.secret, "SESSION_SECRET");

    if let Some(key) = var("YOUTUBE_API_KEY") {
      self.youtube.api_key = Some(key);
    }
    if let Some(flag) = var("REQUIRE_AUTH") {
      self.server.require_auth = flag.trim().eq_ignore_ascii_case("true");
    }
  }

  /// Everything `serve` needs beyond defaults.
  pub fn validate_for_server(&self) -> Result<(), ConfigError> {
    let required = [
      (&self.discord.client_id, "discord.client_id"),
      (&self.discord.client_secret, "discord.client_secret"),
      (&self.discord.bot_token, "discord.bot_token"),
      (&self.discord.guild_id, "discord.guild_id"),
      (&self.discord.required_role_id, "discord.required_role_id"),
      (&self.session.secret, "session.secret"),
    ];
    for (value, name) in required {
      if value.trim().is_empty() {
        return Err(ConfigError::Missing(name));
      }
    }
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session.ttl_hours) {
      return Err(ConfigError::Invalid {
        setting: "session.ttl_hours",
        expected: format!("between 1 and {}", MAX_SESSION_TTL_HOURS),
      });
    }
    Ok(())
  }

  pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
    match &self.storage.data_dir {
      Some(dir) => Ok(dir.clone()),
      None => project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).ok_or(ConfigError::NoProjectDirs("data_dir")),
    }
  }

  pub fn discord_app(&self) -> DiscordApp {
    DiscordApp {
      client_id: self.discord.client_id.clone(),
      client_secret: self.discord.client_secret.clone(),
      bot_token: self.discord.bot_token.clone(),
      guild_id: self.discord.guild_id.clone(),
      redirect_uri: format!("{}/api/auth/callback/discord", self.server.public_url()),
    }
  }

  pub fn role_policy(&self) -> RolePolicy {
    RolePolicy {
      required_role_id: self.discord.required_role_id.clone(),
      admin_role_id: self.discord.admin_role_id.clone(),
    }
  }
}
