use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::youtube::FetchError;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  /// Upstream playlist fetch failed; the cause is logged, not returned.
  #[error("playlist fetch failed: {0}")]
  Fetch(String),
}

impl From<FetchError> for ApiError {
  fn from(err: FetchError) -> Self {
    if err.is_bad_request() { ApiError::BadRequest(err.to_string()) } else { ApiError::Fetch(err.to_string()) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      ApiError::Fetch(ref cause) => {
        error!(cause = %cause, "api: failed to fetch playlist");
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch playlist data".to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
