//! Pure transforms from Web API payloads to the flat records we hand out.

use super::models::{
    Artist, CurrentlyPlaying, Paging, PlayHistory, PlaylistItem, SearchResponse, Track,
};
use serde::Serialize;

pub const NOTHING_PLAYING: &str = "No song currently playing";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_image_url: Option<String>,
    pub song_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration_ms: u64,
    pub explicit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub track: Option<TrackSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_ms: Option<u64>,
}

impl NowPlaying {
    pub fn nothing() -> Self {
        Self {
            is_playing: false,
            message: Some(NOTHING_PLAYING.to_string()),
            track: None,
            progress_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedTrack {
    #[serde(flatten)]
    pub track: TrackSummary,
    pub played_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyPlayed {
    pub tracks: Vec<PlayedTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub artist_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTracks {
    pub time_range: String,
    pub tracks: Vec<TrackSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopArtists {
    pub time_range: String,
    pub artists: Vec<ArtistSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub total: u32,
    pub tracks: Vec<TrackSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    #[serde(flatten)]
    pub track: TrackSummary,
    pub added_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTracks {
    pub playlist_id: String,
    pub total: usize,
    pub tracks: Vec<PlaylistTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub id: String,
    pub preview_url: Option<String>,
    pub has_preview: bool,
}

pub fn track_summary(track: Track) -> TrackSummary {
    let artist = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    TrackSummary {
        id: track.id,
        title: track.name,
        artist,
        album: track.album.name,
        // spotify lists album art largest first
        album_image_url: track.album.images.into_iter().next().map(|i| i.url),
        song_url: track.external_urls.spotify,
        preview_url: track.preview_url,
        duration_ms: track.duration_ms,
        explicit: track.explicit,
        popularity: track.popularity,
    }
}

pub fn now_playing(current: CurrentlyPlaying) -> NowPlaying {
    match current.item {
        Some(track) => NowPlaying {
            is_playing: current.is_playing,
            message: None,
            track: Some(track_summary(track)),
            progress_ms: current.progress_ms,
        },
        // ad break or something we don't model
        None => NowPlaying::nothing(),
    }
}

pub fn recently_played(history: Paging<PlayHistory>) -> RecentlyPlayed {
    RecentlyPlayed {
        tracks: history
            .items
            .into_iter()
            .map(|h| PlayedTrack {
                track: track_summary(h.track),
                played_at: h.played_at,
            })
            .collect(),
    }
}

pub fn artist_summary(artist: Artist) -> ArtistSummary {
    ArtistSummary {
        id: artist.id,
        name: artist.name,
        genres: artist.genres,
        image_url: artist.images.into_iter().next().map(|i| i.url),
        artist_url: artist.external_urls.spotify,
        popularity: artist.popularity,
    }
}

pub fn top_tracks(time_range: &str, page: Paging<Track>) -> TopTracks {
    TopTracks {
        time_range: time_range.to_string(),
        tracks: page.items.into_iter().map(track_summary).collect(),
    }
}

pub fn top_artists(time_range: &str, page: Paging<Artist>) -> TopArtists {
    TopArtists {
        time_range: time_range.to_string(),
        artists: page.items.into_iter().map(artist_summary).collect(),
    }
}

pub fn search_results(query: &str, response: SearchResponse) -> SearchResults {
    let (total, tracks) = match response.tracks {
        Some(page) => (
            page.total,
            page.items.into_iter().map(track_summary).collect(),
        ),
        None => (0, Vec::new()),
    };

    SearchResults {
        query: query.to_string(),
        total,
        tracks,
    }
}

/// Flatten playlist pages. Items whose track went missing are dropped.
pub fn playlist_tracks(playlist_id: &str, items: Vec<PlaylistItem>) -> PlaylistTracks {
    let tracks: Vec<PlaylistTrack> = items
        .into_iter()
        .filter_map(|item| {
            item.track.map(|track| PlaylistTrack {
                track: track_summary(track),
                added_at: item.added_at,
            })
        })
        .collect();

    PlaylistTracks {
        playlist_id: playlist_id.to_string(),
        total: tracks.len(),
        tracks,
    }
}

pub fn preview(id: &str, preview_url: Option<String>) -> Preview {
    Preview {
        id: id.to_string(),
        has_preview: preview_url.is_some(),
        preview_url,
    }
}
