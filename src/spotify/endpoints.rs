//! Every upstream call the proxy makes, as data. Which token it needs and how
//! its statuses are read live here next to the path.

use super::gateway::{ApiRequest, CallSite, Gateway};
use super::models::{Paging, PlaylistItem};
use crate::auth::CredentialKind;
use crate::error::ApiError;
use reqwest::Method;
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use urlencoding::encode as urlencode;

/// max page size the playlist items endpoint hands out
pub const PLAYLIST_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::ShortTerm => write!(f, "short_term"),
            TimeRange::MediumTerm => write!(f, "medium_term"),
            TimeRange::LongTerm => write!(f, "long_term"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(TimeRange::ShortTerm),
            "medium_term" => Ok(TimeRange::MediumTerm),
            "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "time_range must be short_term, medium_term or long_term (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
    Tracks,
    Artists,
}

fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

pub fn currently_playing() -> ApiRequest {
    ApiRequest::get(CredentialKind::User, "/me/player/currently-playing")
        .site(CallSite::CurrentlyPlaying)
}

pub fn recently_played(limit: u32) -> ApiRequest {
    ApiRequest::get(CredentialKind::User, "/me/player/recently-played").query("limit", limit)
}

pub fn top_items(kind: TopKind, time_range: TimeRange, limit: u32) -> ApiRequest {
    let path = match kind {
        TopKind::Tracks => "/me/top/tracks",
        TopKind::Artists => "/me/top/artists",
    };
    ApiRequest::get(CredentialKind::User, path)
        .query("time_range", time_range)
        .query("limit", limit)
}

pub fn search_tracks(query: &str, limit: u32, market: Option<&str>) -> ApiRequest {
    let req = ApiRequest::get(CredentialKind::Client, "/search")
        .query("q", query)
        .query("type", "track")
        .query("limit", limit);
    match market {
        Some(market) => req.query("market", market),
        None => req,
    }
}

pub fn track(track_id: &str) -> ApiRequest {
    ApiRequest::get(CredentialKind::Client, format!("/tracks/{}", urlencode(track_id)))
        .site(CallSite::Lookup)
}

/// One page of playlist items. Public listing goes out on the client token, but
/// a read that feeds a mutation needs the user token so private and
/// collaborative playlists are visible.
pub fn playlist_items(playlist_id: &str, offset: u32, kind: CredentialKind) -> ApiRequest {
    ApiRequest::get(
        kind,
        format!("/playlists/{}/tracks", urlencode(playlist_id)),
    )
    .query("limit", PLAYLIST_PAGE_SIZE)
    .query("offset", offset)
    .site(CallSite::Lookup)
}

pub fn add_to_playlist(playlist_id: &str, track_id: &str) -> ApiRequest {
    ApiRequest::new(
        Method::POST,
        CredentialKind::User,
        format!("/playlists/{}/tracks", urlencode(playlist_id)),
    )
    .json(json!({ "uris": [track_uri(track_id)] }))
    .site(CallSite::PlaylistMutation)
}

pub fn remove_from_playlist(playlist_id: &str, track_id: &str) -> ApiRequest {
    ApiRequest::new(
        Method::DELETE,
        CredentialKind::User,
        format!("/playlists/{}/tracks", urlencode(playlist_id)),
    )
    .json(json!({ "tracks": [{ "uri": track_uri(track_id) }] }))
    .site(CallSite::PlaylistMutation)
}

pub fn save_track(track_id: &str) -> ApiRequest {
    ApiRequest::new(Method::PUT, CredentialKind::User, "/me/tracks").query("ids", track_id)
}

pub fn unsave_track(track_id: &str) -> ApiRequest {
    ApiRequest::new(Method::DELETE, CredentialKind::User, "/me/tracks").query("ids", track_id)
}

/// Walk every page of a playlist
pub async fn all_playlist_items(
    gateway: &Gateway,
    playlist_id: &str,
    kind: CredentialKind,
) -> Result<Vec<PlaylistItem>, ApiError> {
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page: Paging<PlaylistItem> = gateway
            .fetch(playlist_items(playlist_id, offset, kind))
            .await?;
        let fetched = page.items.len() as u32;
        items.extend(page.items);

        // an empty page with a next link would spin forever, so bail on that too
        if page.next.is_none() || fetched == 0 {
            break;
        }
        offset += fetched;
    }

    Ok(items)
}
