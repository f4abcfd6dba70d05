use thiserror::Error;

/// Startup configuration problems. Nothing recovers from these at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
}

/// A token exchange against the accounts service failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token exchange rejected ({status}): {code} {}", .description.as_deref().unwrap_or(""))]
    Rejected {
        status: u16,
        code: String,
        description: Option<String>,
    },
    #[error("token response did not contain an access_token")]
    MissingAccessToken,
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outcome classes of a call against the resource API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// nothing is playing right now. not really an error, handlers turn it into data
    #[error("nothing is currently playing")]
    NotPlaying,
    #[error("resource not found")]
    NotFound,
    #[error("insufficient permission: {body}")]
    Forbidden { body: String },
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
}
