//! Sessions and route protection.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::constants;
use crate::discord::DiscordIdentity;

#[derive(Debug, Error)]
pub enum AuthError {
  /// The member lacks the role that grants access.
  #[error("AccessDenied")]
  AccessDenied,

  #[error("invalid session token: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("session lifetime out of range")]
  Lifetime,
}

impl AuthError {
  /// Error code passed to the `/auth/error` page.
  pub fn code(&self) -> &'static str {
    match self {
      AuthError::AccessDenied => "AccessDenied",
      AuthError::Token(_) | AuthError::Lifetime => "Verification",
    }
  }
}

/// Signed-in user, as carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
  pub sub: String,
  pub name: String,
  pub image: String,
  pub is_admin: bool,
  pub exp: i64,
  pub iat: i64,
}

/// Role ids that gate sign-in and admin access.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
  pub required_role_id: String,
  pub admin_role_id: String,
}

/// A member admitted by [`RolePolicy::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
  pub id: String,
  pub name: String,
  pub image: String,
  pub is_admin: bool,
}

impl RolePolicy {
  /// Sign-in succeeds only when the member holds the required role.
  pub fn admit(&self, identity: &DiscordIdentity) -> Result<SessionUser, AuthError> {
    if self.required_role_id.is_empty() || !identity.has_role(&self.required_role_id) {
      return Err(AuthError::AccessDenied);
    }
    Ok(SessionUser {
      id: identity.user_id.clone(),
      name: identity.name.clone(),
      image: identity.image.clone(),
      is_admin: !self.admin_role_id.is_empty() && identity.has_role(&self.admin_role_id),
    })
  }
}

#[derive(Clone)]
pub struct SessionService {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl SessionService {
  pub fn new(secret: &str, ttl_hours: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl: Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX),
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn issue(&self, user: &SessionUser) -> Result<String, AuthError> {
    let now = Utc::now();
    let expires = now.checked_add_signed(self.ttl).ok_or(AuthError::Lifetime)?;
    let claims = SessionClaims {
      sub: user.id.clone(),
      name: user.name.clone(),
      image: user.image.clone(),
      is_admin: user.is_admin,
      exp: expires.timestamp(),
      iat: now.timestamp(),
    };
    Ok(encode(&Header::default(), &claims, &self.encoding)?)
  }

  pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
    Ok(decode::<SessionClaims>(token, &self.decoding, &Validation::default())?.claims)
  }
}

// --- Route protection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Allow,
  /// No session; send the visitor to the sign-in page.
  SignIn,
  /// Signed in but not allowed here.
  Unauthorized,
}

pub fn is_public_path(path: &str) -> bool {
  constants().public_paths.iter().any(|p| path.starts_with(p.as_str()))
}

fn is_admin_path(path: &str) -> bool {
  path.starts_with(constants().admin_prefix.as_str())
}

/// Decide what happens to a request for `path`.
pub fn route_access(path: &str, session: Option<&SessionClaims>, require_auth: bool) -> Access {
  if is_public_path(path) {
    return Access::Allow;
  }
  if require_auth && session.is_none() {
    return Access::SignIn;
  }
  if is_admin_path(path) && !session.is_some_and(|s| s.is_admin) {
    return Access::Unauthorized;
  }
  Access::Allow
}
