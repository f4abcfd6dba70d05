use super::AppState;
use super::error::AppError;
use super::pipeline::Fetch;
use super::status;
use super::validate;
use crate::auth::CredentialKind;
use crate::cache::{normalize_query, search_key, track_key};
use crate::error::ApiError;
use crate::spotify::endpoints::{self, TopKind};
use crate::spotify::models::{
    Artist, CurrentlyPlaying, Paging, PlayHistory, SearchResponse, SnapshotResponse, Track,
};
use crate::spotify::shape::{self, NowPlaying};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

type JsonResult = Result<Json<Value>, AppError>;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub limit: Option<String>,
    pub time_range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub market: Option<String>,
    pub force: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForceParams {
    pub force: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub track_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistChange {
    pub track_id: String,
    pub snapshot_id: String,
}

pub async fn status_page(State(state): State<AppState>) -> Html<String> {
    Html(status::render(&state).await)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn now_playing(State(state): State<AppState>) -> Result<Response, AppError> {
    let result = Fetch::new(endpoints::currently_playing())
        .run(&state.gateway, |current: Option<CurrentlyPlaying>| {
            current
                .map(shape::now_playing)
                .unwrap_or_else(NowPlaying::nothing)
        })
        .await;

    match result {
        Ok(value) => Ok(Json(value).into_response()),
        Err(AppError::Api(ApiError::NotPlaying)) => {
            tracing::debug!("Nothing playing");
            Ok(Json(NowPlaying::nothing()).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn recently_played(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> JsonResult {
    let limit = validate::limit(params.limit.as_deref())?;

    Fetch::new(endpoints::recently_played(limit))
        .run(&state.gateway, |history: Option<Paging<PlayHistory>>| {
            // a brand new account has no history at all
            history
                .map(shape::recently_played)
                .unwrap_or(shape::RecentlyPlayed { tracks: Vec::new() })
        })
        .await
        .map(Json)
}

pub async fn top_tracks(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> JsonResult {
    let limit = validate::limit(params.limit.as_deref())?;
    let time_range = validate::time_range(params.time_range.as_deref())?;
    let label = time_range.to_string();

    Fetch::new(endpoints::top_items(TopKind::Tracks, time_range, limit))
        .run(&state.gateway, |page: Paging<Track>| {
            shape::top_tracks(&label, page)
        })
        .await
        .map(Json)
}

pub async fn top_artists(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> JsonResult {
    let limit = validate::limit(params.limit.as_deref())?;
    let time_range = validate::time_range(params.time_range.as_deref())?;
    let label = time_range.to_string();

    Fetch::new(endpoints::top_items(TopKind::Artists, time_range, limit))
        .run(&state.gateway, |page: Paging<Artist>| {
            shape::top_artists(&label, page)
        })
        .await
        .map(Json)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> JsonResult {
    // all validation before anything touches the network
    let query = validate::search_query(params.q.as_deref())?;
    let limit = validate::limit(params.limit.as_deref())?;
    let market = validate::market(params.market.as_deref())?;
    let force = validate::flag(params.force.as_deref());

    let key = search_key(&query, limit, market.as_deref());
    // echo the key form, the cached payload is shared by every spelling of it
    let normalized = normalize_query(&query);

    Fetch::new(endpoints::search_tracks(&query, limit, market.as_deref()))
        .cached(&state.search_cache, key)
        .force(force)
        .run(&state.gateway, |response: SearchResponse| {
            shape::search_results(&normalized, response)
        })
        .await
        .map(Json)
}

async fn track_value(state: &AppState, id: &str, force: bool) -> Result<Value, AppError> {
    Fetch::new(endpoints::track(id))
        .cached(&state.track_cache, track_key(id))
        .force(force)
        .run(&state.gateway, shape::track_summary)
        .await
}

pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ForceParams>,
) -> JsonResult {
    let id = validate::track_id(&id)?;
    let force = validate::flag(params.force.as_deref());

    track_value(&state, id, force).await.map(Json)
}

pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<shape::Preview>, AppError> {
    let id = validate::track_id(&id)?;
    let track = track_value(&state, id, false).await?;

    let preview_url = track
        .get("previewUrl")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Json(shape::preview(id, preview_url)))
}

pub async fn playlist(
    State(state): State<AppState>,
) -> Result<Json<shape::PlaylistTracks>, AppError> {
    let items =
        endpoints::all_playlist_items(&state.gateway, &state.playlist_id, CredentialKind::Client)
            .await?;
    Ok(Json(shape::playlist_tracks(&state.playlist_id, items)))
}

pub async fn add_to_playlist(
    State(state): State<AppState>,
    Json(req): Json<AddTrackRequest>,
) -> Result<Response, AppError> {
    let id = validate::track_id(req.track_id.as_deref().unwrap_or_default())?;

    // check first so we never end up with the same song in there twice.
    // user token, the target playlist may well be private
    let items =
        endpoints::all_playlist_items(&state.gateway, &state.playlist_id, CredentialKind::User)
            .await?;
    let already_there = items
        .iter()
        .filter_map(|item| item.track.as_ref())
        .any(|track| track.id.as_deref() == Some(id));
    if already_there {
        tracing::info!("Track {} already in playlist {}", id, state.playlist_id);
        return Err(AppError::Conflict(
            "Track is already in the playlist".to_string(),
        ));
    }

    let snapshot: SnapshotResponse = state
        .gateway
        .fetch(endpoints::add_to_playlist(&state.playlist_id, id))
        .await?;

    tracing::info!("Added track {} to playlist {}", id, state.playlist_id);

    let body = PlaylistChange {
        track_id: id.to_string(),
        snapshot_id: snapshot.snapshot_id,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn remove_from_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaylistChange>, AppError> {
    let id = validate::track_id(&id)?;

    let snapshot: SnapshotResponse = state
        .gateway
        .fetch(endpoints::remove_from_playlist(&state.playlist_id, id))
        .await?;

    tracing::info!("Removed track {} from playlist {}", id, state.playlist_id);

    Ok(Json(PlaylistChange {
        track_id: id.to_string(),
        snapshot_id: snapshot.snapshot_id,
    }))
}

pub async fn save_track(State(state): State<AppState>, Path(id): Path<String>) -> JsonResult {
    let id = validate::track_id(&id)?;
    state.gateway.call(endpoints::save_track(id)).await?;

    tracing::info!("Saved track {} to library", id);
    Ok(Json(json!({ "trackId": id, "saved": true })))
}

pub async fn unsave_track(State(state): State<AppState>, Path(id): Path<String>) -> JsonResult {
    let id = validate::track_id(&id)?;
    state.gateway.call(endpoints::unsave_track(id)).await?;

    tracing::info!("Removed track {} from library", id);
    Ok(Json(json!({ "trackId": id, "saved": false })))
}
