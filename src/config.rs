use crate::auth::{DEFAULT_ACCOUNTS_URL, SpotifyCredentials};
use crate::error::ConfigError;
use crate::spotify::DEFAULT_API_URL;
use clap::Parser;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(name = "tunesproxy")]
#[command(about = "tiny spotify api proxy with oauth token handling and in-memory caching")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Spotify app client ID
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify app client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Refresh token for the account whose playback/library we expose
    #[arg(long, env = "SPOTIFY_REFRESH_TOKEN")]
    pub refresh_token: Option<String>,

    /// Playlist that POST /playlist/tracks adds to
    #[arg(long, env = "SPOTIFY_PLAYLIST_ID")]
    pub playlist_id: Option<String>,

    /// Accounts service base URL (override for testing)
    #[arg(long, env = "SPOTIFY_ACCOUNTS_URL", default_value = DEFAULT_ACCOUNTS_URL)]
    pub accounts_url: String,

    /// Web API base URL (override for testing)
    #[arg(long, env = "SPOTIFY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Comma separated CORS origins. Empty allows any origin
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Search cache TTL in seconds
    #[arg(long, env = "SEARCH_CACHE_TTL", default_value = "300")]
    pub search_cache_ttl: u64,

    /// Track cache TTL in seconds
    #[arg(long, env = "TRACK_CACHE_TTL", default_value = "86400")]
    pub track_cache_ttl: u64,
}

/// Validated runtime config
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub credentials: SpotifyCredentials,
    pub playlist_id: String,
    pub api_url: String,
    pub allowed_origins: Vec<String>,
    pub search_cache_ttl: Duration,
    pub track_cache_ttl: Duration,
}

fn required(value: Option<&String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

fn base_url(value: &str, name: &'static str) -> Result<String, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let credentials = SpotifyCredentials {
            client_id: required(args.client_id.as_ref(), "SPOTIFY_CLIENT_ID")?,
            client_secret: required(args.client_secret.as_ref(), "SPOTIFY_CLIENT_SECRET")?,
            refresh_token: required(args.refresh_token.as_ref(), "SPOTIFY_REFRESH_TOKEN")?,
            accounts_url: base_url(&args.accounts_url, "SPOTIFY_ACCOUNTS_URL")?,
        };

        Ok(Self {
            host: args.host.clone(),
            port: args.port,
            credentials,
            playlist_id: required(args.playlist_id.as_ref(), "SPOTIFY_PLAYLIST_ID")?,
            api_url: base_url(&args.api_url, "SPOTIFY_API_URL")?,
            allowed_origins: args
                .allowed_origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            search_cache_ttl: Duration::from_secs(args.search_cache_ttl),
            track_cache_ttl: Duration::from_secs(args.track_cache_ttl),
        })
    }
}
