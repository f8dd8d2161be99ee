use axum::{
  Extension, Json,
  extract::{Query, State},
  response::{IntoResponse, Redirect, Response},
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{
  Cookie, Cookies,
  cookie::{SameSite, time::Duration},
};
use tracing::{error, info, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::auth::SessionClaims;
use crate::constants::constants;
use crate::youtube::{FetchError, FetchedPlaylist, extract_playlist_id};

// --- YouTube ---

#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
  pub url: Option<String>,
}

/// `GET /api/youtube/playlist?url=...`
pub async fn youtube_playlist(
  State(state): State<AppState>,
  Query(query): Query<PlaylistQuery>,
) -> Result<Json<FetchedPlaylist>, ApiError> {
  let url = query.url.unwrap_or_default();
  if url.trim().is_empty() {
    return Err(FetchError::MissingUrl.into());
  }
  if extract_playlist_id(&url).is_none() {
    return Err(FetchError::InvalidUrl.into());
  }
  Ok(Json(state.source.fetch_playlist(&url).await?))
}

// --- Auth ---

fn cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
  Cookie::build((name, value))
    .path("/")
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .max_age(max_age)
    .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
  Cookie::build((name, "")).path("/").build()
}

fn auth_error(code: &str) -> Response {
  Redirect::temporary(&format!("{}?error={}", constants().error_path, code)).into_response()
}

/// `GET /api/auth/signin`: start the Discord OAuth flow.
pub async fn signin(State(state): State<AppState>, cookies: Cookies) -> Response {
  let nonce = uuid::Uuid::new_v4().simple().to_string();
  match state.identity.authorize_url(&nonce) {
    Ok(url) => {
      cookies.add(cookie(&constants().state_cookie, nonce, Duration::minutes(10), state.options.secure_cookies));
      Redirect::temporary(&url).into_response()
    }
    Err(e) => {
      error!(err = %e, "auth: cannot build authorize URL");
      auth_error("Configuration")
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
  pub code: Option<String>,
  pub state: Option<String>,
  pub error: Option<String>,
}

/// `GET /api/auth/callback/discord`
pub async fn callback(State(state): State<AppState>, cookies: Cookies, Query(query): Query<CallbackQuery>) -> Response {
  let c = constants();
  let expected = cookies.get(&c.state_cookie).map(|cookie| cookie.value().to_string());
  cookies.remove(removal(&c.state_cookie));

  if let Some(reason) = query.error {
    warn!(reason = %reason, "auth: provider returned an error");
    return auth_error("AccessDenied");
  }
  let (Some(code), Some(returned)) = (query.code, query.state) else {
    return auth_error("Verification");
  };
  if expected.as_deref() != Some(returned.as_str()) {
    warn!("auth: OAuth state mismatch");
    return auth_error("Verification");
  }

  let identity = match state.identity.identify(&code).await {
    Ok(identity) => identity,
    Err(e) => {
      error!(err = %e, "auth: Discord sign-in failed");
      return auth_error("Verification");
    }
  };
  let user = match state.roles.admit(&identity) {
    Ok(user) => user,
    Err(e) => {
      info!(user_id = %identity.user_id, "auth: sign-in refused, required role missing");
      return auth_error(e.code());
    }
  };
  let token = match state.sessions.issue(&user) {
    Ok(token) => token,
    Err(e) => {
      error!(err = %e, "auth: failed to issue session");
      return auth_error(e.code());
    }
  };

  let max_age = Duration::seconds(state.sessions.ttl().num_seconds());
  cookies.add(cookie(&c.session_cookie, token, max_age, state.options.secure_cookies));
  info!(user_id = %user.id, name = %user.name, is_admin = user.is_admin, "auth: signed in");
  Redirect::temporary("/").into_response()
}

/// `GET /api/auth/session`: the current session, or `{}`.
pub async fn session(claims: Option<Extension<SessionClaims>>) -> Json<serde_json::Value> {
  let Some(Extension(claims)) = claims else {
    return Json(json!({}));
  };
  let expires = Utc.timestamp_opt(claims.exp, 0).single().map(|t| t.to_rfc3339());
  Json(json!({
    "user": {
      "id": claims.sub,
      "name": claims.name,
      "image": claims.image,
      "isAdmin": claims.is_admin,
    },
    "expires": expires,
  }))
}

/// `GET|POST /api/auth/signout`
pub async fn signout(cookies: Cookies) -> Redirect {
  cookies.remove(removal(&constants().session_cookie));
  Redirect::temporary(&constants().signin_path)
}
