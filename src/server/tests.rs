use super::*;
use crate::auth::{self, SpotifyCredentials};
use crate::cache::{SEARCH_CACHE_CAPACITY, TRACK_CACHE_CAPACITY};
use crate::clock::{Clock, SystemClock};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn track_json(id: &str, preview: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "artists": [{"name": "Daft Punk"}],
        "album": {"name": "Discovery", "images": [{"url": "https://i.scdn.co/cover"}]},
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)},
        "preview_url": preview,
        "duration_ms": 200000,
        "explicit": false
    })
}

async fn mount_tokens(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn app(server: &MockServer) -> Router {
    app_with_api(server, &format!("{}/v1", server.uri()))
}

/// accounts service on the mock server, resource API wherever `api_url` points
fn app_with_api(server: &MockServer, api_url: &str) -> Router {
    let http = reqwest::Client::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let credentials = SpotifyCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "rt".to_string(),
        accounts_url: server.uri(),
    };
    let tokens = Arc::new(auth::token_store(http.clone(), &credentials, clock.clone()));

    router(AppState {
        gateway: Gateway::new(http, api_url, tokens),
        search_cache: Arc::new(ResponseCache::new(
            "search",
            SEARCH_CACHE_CAPACITY,
            chrono::Duration::minutes(5),
            clock.clone(),
        )),
        track_cache: Arc::new(ResponseCache::new(
            "track",
            TRACK_CACHE_CAPACITY,
            chrono::Duration::hours(24),
            clock,
        )),
        playlist_id: Arc::from("pl"),
    })
}

async fn setup() -> (MockServer, Router) {
    let server = MockServer::start().await;
    mount_tokens(&server).await;
    let app = app(&server);
    (server, app)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_now_playing_204_means_nothing_playing() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/now-playing")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"isPlaying": false, "message": "No song currently playing"})
    );
}

#[tokio::test]
async fn test_now_playing_with_track() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "progress_ms": 5000,
            "item": track_json("abc", None)
        })))
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/now-playing")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isPlaying"], true);
    assert_eq!(body["title"], "Track abc");
    assert_eq!(body["artist"], "Daft Punk");
    assert_eq!(body["progressMs"], 5000);
}

#[tokio::test]
async fn test_track_is_cached_and_force_refetches() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json("abc", None)))
        .expect(2)
        .mount(&server)
        .await;

    let (status, first) = send(&app, get("/track/abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], "abc");

    // served from cache, no second upstream call
    let (_, second) = send(&app, get("/track/abc")).await;
    assert_eq!(first, second);

    // force goes upstream again
    let (status, _) = send(&app, get("/track/abc?force=true")).await;
    assert_eq!(status, StatusCode::OK);

    server.verify().await;
}

#[tokio::test]
async fn test_search_too_short_never_touches_network() {
    let server = MockServer::start().await;
    let app = app(&server);

    let (status, body) = send(&app, get("/search?q=a")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 2"));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "no token or API call expected");
}

#[tokio::test]
async fn test_search_case_variants_share_cache_entry() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("type", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {"items": [track_json("abc", None)], "total": 1, "next": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/search?q=Daft%20Punk")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["tracks"][0]["id"], "abc");
    assert_eq!(body["query"], "daft punk");

    // the shared entry doesn't leak the first caller's spelling
    let (status, second) = send(&app, get("/search?q=daft%20%20punk")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["query"], "daft punk");
    assert_eq!(second, body);

    server.verify().await;
}

#[tokio::test]
async fn test_search_upstream_failure_is_bad_gateway() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/search?q=daft")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["upstreamStatus"], 500);
}

#[tokio::test]
async fn test_unknown_track_is_not_found() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (status, _) = send(&app, get("/track/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_reuses_track_cache() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json("abc", Some("https://p.scdn.co/abc"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    send(&app, get("/track/abc")).await;
    let (status, body) = send(&app, get("/preview/abc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": "abc", "previewUrl": "https://p.scdn.co/abc", "hasPreview": true})
    );
    server.verify().await;
}

#[tokio::test]
async fn test_add_duplicate_track_is_conflict() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"added_at": "2024-01-01T00:00:00Z", "track": track_json("abc", None)}],
            "total": 1,
            "next": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s"})))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(&app, post_json("/playlist/tracks", json!({"trackId": "abc"}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Track is already in the playlist");
    server.verify().await;
}

#[tokio::test]
async fn test_duplicate_check_reads_private_playlist_as_user() {
    let (server, app) = setup().await;
    // a private playlist is invisible to the client credential
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .and(header("authorization", "Bearer app-token"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": track_json("abc", None)}],
            "total": 1,
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "s"})))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(&app, post_json("/playlist/tracks", json!({"trackId": "abc"}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Track is already in the playlist");
    server.verify().await;
}

#[tokio::test]
async fn test_add_new_track() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": track_json("abc", None)}],
            "total": 1,
            "next": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl/tracks"))
        .and(body_json(json!({"uris": ["spotify:track:xyz"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"snapshot_id": "snap-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(&app, post_json("/playlist/tracks", json!({"trackId": "xyz"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"trackId": "xyz", "snapshotId": "snap-2"}));
    server.verify().await;
}

#[tokio::test]
async fn test_add_track_forbidden() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [], "total": 0, "next": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl/tracks"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"status": 403, "message": "Insufficient client scope"}
        })))
        .mount(&server)
        .await;

    let (status, body) = send(&app, post_json("/playlist/tracks", json!({"trackId": "xyz"}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Not allowed"));
}

#[tokio::test]
async fn test_playlist_follows_pages() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": track_json("one", None)}],
            "total": 2,
            "next": "https://api.spotify.com/v1/playlists/pl/tracks?offset=1&limit=100"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl/tracks"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": track_json("two", None)}, {"track": null}],
            "total": 2,
            "next": null
        })))
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/playlist")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playlistId"], "pl");
    assert_eq!(body["total"], 2);
    assert_eq!(body["tracks"][1]["id"], "two");
}

#[tokio::test]
async fn test_recently_played_empty_history() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/recently-played"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/recently-played?limit=5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"tracks": []}));
}

#[tokio::test]
async fn test_top_artists_shape() {
    let (server, app) = setup().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .and(query_param("time_range", "short_term"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "a1",
                "name": "Daft Punk",
                "genres": ["french house"],
                "images": [{"url": "https://i.scdn.co/dp"}],
                "external_urls": {"spotify": "https://open.spotify.com/artist/a1"},
                "popularity": 80
            }]
        })))
        .mount(&server)
        .await;

    let (status, body) = send(&app, get("/top/artists?time_range=short_term")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeRange"], "short_term");
    assert_eq!(body["artists"][0]["name"], "Daft Punk");
    assert_eq!(body["artists"][0]["imageUrl"], "https://i.scdn.co/dp");
}

#[tokio::test]
async fn test_bad_time_range_rejected_locally() {
    let server = MockServer::start().await;
    let app = app(&server);

    let (status, _) = send(&app, get("/top/tracks?time_range=forever")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_revoked_refresh_token_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&server)
        .await;
    let app = app(&server);

    let (status, body) = send(&app, get("/now-playing")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to authenticate with Spotify");
}

#[tokio::test]
async fn test_save_and_unsave_library_track() {
    let (server, app) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/tracks"))
        .and(query_param("ids", "abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/me/tracks"))
        .and(query_param("ids", "abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let put = Request::builder()
        .method("PUT")
        .uri("/library/tracks/abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, put).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/library/tracks/abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], false);

    server.verify().await;
}

#[tokio::test]
async fn test_status_page_and_health() {
    let server = MockServer::start().await;
    let app = app(&server);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let html = body.as_str().unwrap();
    assert!(html.contains("tunesproxy is up"));
    assert!(html.contains("/now-playing"));
    // rendering the page must not go fetch tokens
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Answers one request with a 200 that promises more body than it sends, then
/// hangs up.
async fn truncated_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 500\r\n\r\n{\"is_play",
            )
            .await;
        let _ = socket.shutdown().await;
    });
    format!("http://{}/v1", addr)
}

#[tokio::test]
async fn test_truncated_upstream_body_is_bad_gateway() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;
    let app = app_with_api(&server, &truncated_api().await);

    let (status, body) = send(&app, get("/now-playing")).await;

    // must not read as "nothing playing"
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to reach Spotify");
}
