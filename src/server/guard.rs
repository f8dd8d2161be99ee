use axum::{
  extract::{Request, State},
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::debug;

use super::state::AppState;
use crate::auth::{Access, SessionClaims, route_access};
use crate::constants::constants;

/// Valid session from the request's cookie, if any.
pub fn session_from(cookies: &Cookies, state: &AppState) -> Option<SessionClaims> {
  let cookie = cookies.get(&constants().session_cookie)?;
  match state.sessions.verify(cookie.value()) {
    Ok(claims) => Some(claims),
    Err(e) => {
      debug!(err = %e, "guard: ignoring invalid session cookie");
      None
    }
  }
}

/// Route protection for every request. A valid session is attached as a request extension.
pub async fn guard(State(state): State<AppState>, cookies: Cookies, mut request: Request, next: Next) -> Response {
  let c = constants();
  let session = session_from(&cookies, &state);
  let path = request.uri().path().to_string();

  match route_access(&path, session.as_ref(), state.options.require_auth) {
    Access::Allow => {
      if let Some(claims) = session {
        request.extensions_mut().insert(claims);
      }
      next.run(request).await
    }
    Access::SignIn => {
      debug!(path = %path, "guard: no session");
      Redirect::temporary(&c.signin_path).into_response()
    }
    Access::Unauthorized => {
      debug!(path = %path, "guard: admin required");
      Redirect::temporary(&c.unauthorized_path).into_response()
    }
  }
}
