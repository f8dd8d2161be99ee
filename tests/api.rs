/// HTTP router tests: playlist endpoint, sign-in flow and route protection.
mod common;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
  response::Response,
};
use common::{FakeSource, app, app_with, sample_playlist, session_cookie};
use coursedeck::server::ServerOptions;
use serde_json::Value;
use tower::util::ServiceExt;

async fn get(app: Router, uri: &str, cookie: Option<&str>) -> Response {
  let mut request = Request::builder().uri(uri);
  if let Some(cookie) = cookie {
    request = request.header(header::COOKIE, cookie);
  }
  app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

async fn json(response: Response) -> Value {
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
  response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

fn set_cookies(response: &Response) -> Vec<String> {
  response.headers().get_all(header::SET_COOKIE).iter().filter_map(|v| v.to_str().ok()).map(str::to_string).collect()
}

// --- /api/youtube/playlist ---

#[tokio::test]
async fn playlist_missing_url_is_400() {
  let response = get(app(FakeSource { playlist: None }), "/api/youtube/playlist", Some(&session_cookie(false))).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json(response).await["error"], "Missing playlist URL");
}

#[tokio::test]
async fn playlist_without_list_param_is_400() {
  let uri = "/api/youtube/playlist?url=https%3A%2F%2Fyoutube.com%2Fwatch%3Fv%3Dabc";
  let response = get(app(FakeSource { playlist: None }), uri, Some(&session_cookie(false))).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json(response).await["error"], "Invalid playlist URL");
}

#[tokio::test]
async fn playlist_upstream_failure_is_500() {
  let uri = "/api/youtube/playlist?url=https%3A%2F%2Fyoutube.com%2Fplaylist%3Flist%3DPL1";
  let response = get(app(FakeSource { playlist: None }), uri, Some(&session_cookie(false))).await;
  assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(json(response).await["error"], "Failed to fetch playlist data");
}

#[tokio::test]
async fn playlist_success_returns_normalized_shape() {
  let uri = "/api/youtube/playlist?url=https%3A%2F%2Fyoutube.com%2Fplaylist%3Flist%3DPL1";
  let response = get(app(FakeSource { playlist: Some(sample_playlist()) }), uri, Some(&session_cookie(false))).await;
  assert_eq!(response.status(), StatusCode::OK);
  let body = json(response).await;
  assert_eq!(body["name"], "Discrete Maths");
  assert_eq!(body["description"], "Lecture series");
  assert_eq!(body["videos"][0]["id"], "abc");
  assert_eq!(body["videos"][0]["duration"], "PT12M5S");
  assert_eq!(body["videos"][0]["url"], "https://youtube.com/watch?v=abc");
}

// --- Route protection ---

#[tokio::test]
async fn anonymous_requests_redirect_to_signin() {
  for uri in ["/", "/api/youtube/playlist?url=x", "/playlists/1"] {
    let response = get(app(FakeSource { playlist: None }), uri, None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{}", uri);
    assert_eq!(location(&response), "/auth/signin");
  }
}

#[tokio::test]
async fn invalid_session_cookie_counts_as_anonymous() {
  let response = get(app(FakeSource { playlist: None }), "/", Some("coursedeck_session=garbage")).await;
  assert_eq!(location(&response), "/auth/signin");
}

#[tokio::test]
async fn public_paths_need_no_session() {
  for uri in ["/auth/signin", "/auth/error?error=AccessDenied", "/auth/unauthorized", "/api/auth/session"] {
    let response = get(app(FakeSource { playlist: None }), uri, None).await;
    assert_eq!(response.status(), StatusCode::OK, "{}", uri);
  }
}

#[tokio::test]
async fn admin_requires_admin_session() {
  let response = get(app(FakeSource { playlist: None }), "/admin/playlists", Some(&session_cookie(false))).await;
  assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
  assert_eq!(location(&response), "/auth/unauthorized");

  let response = get(app(FakeSource { playlist: None }), "/admin/playlists", Some(&session_cookie(true))).await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn optional_auth_lets_anonymous_through() {
  let options = ServerOptions { require_auth: false, ..Default::default() };
  let response = get(app_with(FakeSource { playlist: None }, &["member"], options.clone()), "/", None).await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);

  let response = get(app_with(FakeSource { playlist: None }, &["member"], options), "/admin", None).await;
  assert_eq!(location(&response), "/auth/unauthorized");
}

#[tokio::test]
async fn web_dir_serves_spa_with_index_fallback() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("index.html"), "<html>coursedeck</html>").unwrap();
  std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
  let options = ServerOptions { web_dir: Some(dir.path().to_path_buf()), ..Default::default() };

  let cases =
    [("/", "<html>coursedeck</html>"), ("/app.js", "console.log(1)"), ("/playlists/42", "<html>coursedeck</html>")];
  for (uri, expected) in cases {
    let app = app_with(FakeSource { playlist: None }, &["member"], options.clone());
    let response = get(app, uri, Some(&session_cookie(false))).await;
    assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), expected);
  }
}

// --- Sign-in flow ---

#[tokio::test]
async fn signin_redirects_to_provider_with_state_cookie() {
  let response = get(app(FakeSource { playlist: None }), "/api/auth/signin", None).await;
  assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
  let target = location(&response).to_string();
  assert!(target.starts_with("https://discord.test/oauth2/authorize?state="));
  let state = target.rsplit('=').next().unwrap().to_string();
  let cookies = set_cookies(&response);
  let prefix = format!("coursedeck_oauth_state={}", state);
  assert!(cookies.iter().any(|c| c.starts_with(&prefix) && c.contains("HttpOnly")));
}

#[tokio::test]
async fn callback_with_member_role_issues_session() {
  let uri = "/api/auth/callback/discord?code=good&state=s1";
  let response = get(app(FakeSource { playlist: None }), uri, Some("coursedeck_oauth_state=s1")).await;
  assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
  assert_eq!(location(&response), "/");
  let session = set_cookies(&response).into_iter().find(|c| c.starts_with("coursedeck_session=")).unwrap();
  let pair = session.split(';').next().unwrap().to_string();

  let response = get(app(FakeSource { playlist: None }), "/api/auth/session", Some(&pair)).await;
  let body = json(response).await;
  assert_eq!(body["user"]["id"], "1001");
  assert_eq!(body["user"]["name"], "Ada");
  assert_eq!(body["user"]["isAdmin"], false);
}

#[tokio::test]
async fn callback_without_required_role_is_denied() {
  let app = app_with(FakeSource { playlist: None }, &["admin"], ServerOptions::default());
  let response = get(app, "/api/auth/callback/discord?code=good&state=s1", Some("coursedeck_oauth_state=s1")).await;
  assert_eq!(location(&response), "/auth/error?error=AccessDenied");
  assert!(!set_cookies(&response).iter().any(|c| c.starts_with("coursedeck_session=") && !c.contains("Max-Age=0")));
}

#[tokio::test]
async fn callback_with_state_mismatch_is_rejected() {
  let uri = "/api/auth/callback/discord?code=good&state=s1";
  let response = get(app(FakeSource { playlist: None }), uri, Some("coursedeck_oauth_state=other")).await;
  assert_eq!(location(&response), "/auth/error?error=Verification");
}

#[tokio::test]
async fn callback_with_bad_code_is_rejected() {
  let uri = "/api/auth/callback/discord?code=bad&state=s1";
  let response = get(app(FakeSource { playlist: None }), uri, Some("coursedeck_oauth_state=s1")).await;
  assert_eq!(location(&response), "/auth/error?error=Verification");
}

#[tokio::test]
async fn session_is_empty_when_signed_out() {
  let response = get(app(FakeSource { playlist: None }), "/api/auth/session", None).await;
  assert_eq!(json(response).await, serde_json::json!({}));
}

#[tokio::test]
async fn signout_clears_session() {
  let response = get(app(FakeSource { playlist: None }), "/api/auth/signout", Some(&session_cookie(false))).await;
  assert_eq!(location(&response), "/auth/signin");
  assert!(set_cookies(&response).iter().any(|c| c.starts_with("coursedeck_session=") && c.contains("Max-Age=0")));
}
