use crate::error::{ApiError, AuthError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Everything a handler can fail with
#[derive(Debug, Error)]
pub enum AppError {
    /// bad caller input, caught before any network call
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Api(ApiError::Auth(e))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

fn error_response(status: StatusCode, error: impl Into<String>, upstream: Option<u16>) -> Response {
    let body = ErrorBody {
        error: error.into(),
        upstream_status: upstream,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => error_response(StatusCode::BAD_REQUEST, msg, None),
            AppError::Conflict(msg) => error_response(StatusCode::CONFLICT, msg, None),
            AppError::Api(ApiError::NotFound) => {
                error_response(StatusCode::NOT_FOUND, "Not found", None)
            }
            AppError::Api(ApiError::Forbidden { body }) => {
                tracing::warn!("Spotify refused playlist change: {}", body);
                error_response(
                    StatusCode::FORBIDDEN,
                    "Not allowed to modify this playlist (missing scope or not the owner)",
                    None,
                )
            }
            AppError::Api(ApiError::Upstream { status, body }) => {
                tracing::error!("Spotify API error {}: {}", status, body);
                error_response(StatusCode::BAD_GATEWAY, "Spotify API error", Some(status))
            }
            AppError::Api(ApiError::Auth(e)) => {
                tracing::error!("Token exchange failed: {}", e);
                error_response(
                    StatusCode::BAD_GATEWAY,
                    "Failed to authenticate with Spotify",
                    None,
                )
            }
            AppError::Api(e) => {
                tracing::error!("Spotify request failed: {}", e);
                error_response(StatusCode::BAD_GATEWAY, "Failed to reach Spotify", None)
            }
        }
    }
}
