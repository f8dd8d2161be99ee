//! HTTP service: the playlist fetch endpoint, Discord sign-in, and route protection
//! in front of an optional prebuilt web UI.

pub mod api;
pub mod error;
pub mod guard;
pub mod pages;
pub mod state;

use axum::{Router, http::StatusCode, middleware, routing::get};
use std::net::SocketAddr;
use tower_cookies::CookieManagerLayer;
use tower_http::{
  services::{ServeDir, ServeFile},
  trace::TraceLayer,
};
use tracing::info;

pub use error::ApiError;
pub use state::{AppState, ServerOptions};

async fn not_found() -> StatusCode {
  StatusCode::NOT_FOUND
}

pub fn router(state: AppState) -> Router {
  let api_routes = Router::new()
    .route("/youtube/playlist", get(api::youtube_playlist))
    .route("/auth/signin", get(api::signin))
    .route("/auth/callback/discord", get(api::callback))
    .route("/auth/session", get(api::session))
    .route("/auth/signout", get(api::signout).post(api::signout));

  let page_routes = Router::new()
    .route("/auth/signin", get(pages::signin))
    .route("/auth/error", get(pages::error))
    .route("/auth/unauthorized", get(pages::unauthorized));

  let router = Router::new().nest("/api", api_routes).merge(page_routes);

  // Unrouted paths go to the web UI, with index.html as the single-page fallback.
  let router = match &state.options.web_dir {
    Some(dir) => router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))),
    None => router.fallback(not_found),
  };

  router
    .layer(middleware::from_fn_with_state(state.clone(), guard::guard))
    .layer(CookieManagerLayer::new())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!(addr = %addr, require_auth = state.options.require_auth, "server: listening");
  axum::serve(listener, router(state)).await
}
