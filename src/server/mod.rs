mod error;
mod handlers;
mod pipeline;
mod status;
mod validate;

use crate::cache::ResponseCache;
use crate::spotify::Gateway;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    /// short ttl, search queries
    pub search_cache: Arc<ResponseCache<Value>>,
    /// long ttl, track metadata barely ever changes
    pub track_cache: Arc<ResponseCache<Value>>,
    pub playlist_id: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::status_page))
        .route("/health", get(handlers::health))
        .route("/now-playing", get(handlers::now_playing))
        .route("/recently-played", get(handlers::recently_played))
        .route("/top/tracks", get(handlers::top_tracks))
        .route("/top/artists", get(handlers::top_artists))
        .route("/search", get(handlers::search))
        .route("/track/{id}", get(handlers::track))
        .route("/preview/{id}", get(handlers::preview))
        .route("/playlist", get(handlers::playlist))
        .route("/playlist/tracks", post(handlers::add_to_playlist))
        .route(
            "/playlist/tracks/{id}",
            delete(handlers::remove_from_playlist),
        )
        .route(
            "/library/tracks/{id}",
            put(handlers::save_track).delete(handlers::unsave_track),
        )
        .with_state(state)
}

/// No origins configured = anyone can call us (it's public data anyway)
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests;
