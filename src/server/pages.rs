use axum::{extract::Query, response::Html};
use serde::Deserialize;

fn page(title: &str, body: &str) -> Html<String> {
  Html(format!(
    "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title></head>\
     <body><main><h1>{title}</h1>{body}</main></body></html>"
  ))
}

pub async fn signin() -> Html<String> {
  page(
    "Sign in",
    "<p>Members of the study server can sign in with Discord.</p>\
     <p><a href=\"/api/auth/signin\">Sign in with Discord</a></p>",
  )
}

#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
  pub error: Option<String>,
}

pub fn error_message(code: Option<&str>) -> &'static str {
  match code {
    Some("AccessDenied") => "You need to be a verified member to access this site.",
    Some("Verification") => "Unable to verify your Discord account.",
    _ => "An error occurred during authentication.",
  }
}

pub async fn error(Query(query): Query<ErrorQuery>) -> Html<String> {
  let message = error_message(query.error.as_deref());
  page("Authentication Error", &format!("<p>{}</p><p><a href=\"/\">Return Home</a></p>", message))
}

pub async fn unauthorized() -> Html<String> {
  page("Access Denied", "<p>You don't have permission to access this page.</p><p><a href=\"/\">Return Home</a></p>")
}
