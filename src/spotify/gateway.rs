use crate::auth::{CredentialKind, TokenStore};
use crate::error::ApiError;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// What a call is for. Decides which statuses mean something other than
/// "upstream broke".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    General,
    /// 204/404 = nothing playing
    CurrentlyPlaying,
    /// 404 = no such track/playlist
    Lookup,
    /// 403 = token lacks the scope/ownership to change the playlist
    PlaylistMutation,
}

/// One outbound call against the resource API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub kind: CredentialKind,
    pub site: CallSite,
}

impl ApiRequest {
    pub fn new(method: Method, kind: CredentialKind, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            kind,
            site: CallSite::General,
        }
    }

    pub fn get(kind: CredentialKind, path: impl Into<String>) -> Self {
        Self::new(Method::GET, kind, path)
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn site(mut self, site: CallSite) -> Self {
        self.site = site;
        self
    }
}

/// Attaches the right bearer token and turns statuses into [`ApiError`]s
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl Gateway {
    pub fn new(client: Client, base_url: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Raw call. Empty 2xx bodies come back as `Value::Null`.
    pub async fn call(&self, req: ApiRequest) -> Result<Value, ApiError> {
        let token = self.tokens.token(req.kind).await?;
        let url = format!("{}{}", self.base_url, req.path);

        tracing::debug!("{} {} ({} token)", req.method, req.path, req.kind);

        let mut builder = self
            .client
            .request(req.method.clone(), &url)
            .bearer_auth(&token);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = if status.is_success() {
            // a broken read here is a transport failure, not an empty payload
            response.text().await?
        } else {
            // only ever ends up in an error message
            response.text().await.unwrap_or_default()
        };

        classify(status, req.site, &body)?;

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Call and decode into an upstream model
    pub async fn fetch<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
        let value = self.call(req).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Map a response status onto the error taxonomy for the given call site.
pub fn classify(status: StatusCode, site: CallSite, body: &str) -> Result<(), ApiError> {
    match (site, status) {
        (CallSite::CurrentlyPlaying, StatusCode::NO_CONTENT | StatusCode::NOT_FOUND) => {
            Err(ApiError::NotPlaying)
        }
        (_, s) if s.is_success() => Ok(()),
        (CallSite::Lookup, StatusCode::NOT_FOUND) => Err(ApiError::NotFound),
        (CallSite::PlaylistMutation, StatusCode::FORBIDDEN) => Err(ApiError::Forbidden {
            body: body.to_string(),
        }),
        (_, s) => Err(ApiError::Upstream {
            status: s.as_u16(),
            body: body.to_string(),
        }),
    }
}
