use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{RolePolicy, SessionService};
use crate::discord::IdentityProvider;
use crate::youtube::PlaylistSource;

/// Behaviour switches for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerOptions {
  pub require_auth: bool,
  pub web_dir: Option<PathBuf>,
  /// Mark cookies `Secure`; set when served over https.
  pub secure_cookies: bool,
}

impl Default for ServerOptions {
  fn default() -> Self {
    Self { require_auth: true, web_dir: None, secure_cookies: false }
  }
}

/// Shared across all handlers.
#[derive(Clone)]
pub struct AppState {
  pub source: Arc<dyn PlaylistSource>,
  pub identity: Arc<dyn IdentityProvider>,
  pub sessions: Arc<SessionService>,
  pub roles: Arc<RolePolicy>,
  pub options: Arc<ServerOptions>,
}

impl AppState {
  pub fn new(
    source: Arc<dyn PlaylistSource>,
    identity: Arc<dyn IdentityProvider>,
    sessions: SessionService,
    roles: RolePolicy,
    options: ServerOptions,
  ) -> Self {
    Self {
      source,
      identity,
      sessions: Arc::new(sessions),
      roles: Arc::new(roles),
      options: Arc::new(options),
    }
  }
}
