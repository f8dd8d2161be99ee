//! YouTube Data API adapter against a mock server.

use coursedeck::youtube::{FetchError, PlaylistSource, YoutubeClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://www.youtube.com/playlist?list=PL1";

fn client(server: &MockServer) -> YoutubeClient {
  YoutubeClient::with_base(reqwest::Client::new(), &server.uri(), Some("k".to_string()))
}

async fn mount_playlist_meta(server: &MockServer) {
  Mock::given(method("GET"))
    .and(path("/playlists"))
    .and(query_param("id", "PL1"))
    .and(query_param("key", "k"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "items": [{ "snippet": { "title": "Operating Systems", "description": "Spring term" } }]
    })))
    .mount(server)
    .await;
}

#[tokio::test]
async fn fetch_paginates_and_resolves_durations() {
  let server = MockServer::start().await;
  mount_playlist_meta(&server).await;

  // Second page first: the earliest mounted matching mock wins.
  Mock::given(method("GET"))
    .and(path("/playlistItems"))
    .and(query_param("pageToken", "p2"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "items": [{
        "snippet": { "title": "Scheduling", "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/v3/mq.jpg" } } },
        "contentDetails": { "videoId": "v3" }
      }]
    })))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/playlistItems"))
    .and(query_param("playlistId", "PL1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "nextPageToken": "p2",
      "items": [
        {
          "snippet": { "title": "Processes", "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/v1/mq.jpg" } } },
          "contentDetails": { "videoId": "v1" }
        },
        { "snippet": { "title": "Private video" }, "contentDetails": {} }
      ]
    })))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/videos"))
    .and(query_param("id", "v1,v3"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "items": [
        { "id": "v1", "contentDetails": { "duration": "PT1H2M3S" } },
        { "id": "v3", "contentDetails": { "duration": "PT45S" } }
      ]
    })))
    .mount(&server)
    .await;

  let playlist = client(&server).fetch_playlist(URL).await.unwrap();
  assert_eq!(playlist.name, "Operating Systems");
  assert_eq!(playlist.description, "Spring term");
  let ids: Vec<_> = playlist.videos.iter().map(|v| v.id.as_str()).collect();
  assert_eq!(ids, ["v1", "v3"]);
  assert_eq!(playlist.videos[0].title, "Processes");
  assert_eq!(playlist.videos[0].duration, "PT1H2M3S");
  assert_eq!(playlist.videos[0].thumbnail, "https://i.ytimg.com/vi/v1/mq.jpg");
  assert_eq!(playlist.videos[0].url, "https://youtube.com/watch?v=v1");
  assert_eq!(playlist.videos[1].duration, "PT45S");
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/playlists"))
    .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": { "message": "quota" } })))
    .mount(&server)
    .await;

  let err = client(&server).fetch_playlist(URL).await.unwrap_err();
  assert!(matches!(err, FetchError::Status { status: 403, .. }));
  assert!(!err.is_bad_request());
}

#[tokio::test]
async fn empty_playlist_has_no_videos() {
  let server = MockServer::start().await;
  mount_playlist_meta(&server).await;
  Mock::given(method("GET"))
    .and(path("/playlistItems"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
    .mount(&server)
    .await;

  let playlist = client(&server).fetch_playlist(URL).await.unwrap();
  assert_eq!(playlist.name, "Operating Systems");
  assert!(playlist.videos.is_empty());
}
