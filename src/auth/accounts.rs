use super::traits::{Grant, TokenExchanger, TokenGrant};
use crate::error::AuthError;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

// lifetime to assume if the accounts service leaves expires_in out
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Talks to the accounts service token endpoint
#[derive(Clone)]
pub struct AccountsClient {
    client: Client,
    token_url: String,
    auth_header: String,
}

// everything optional so a half-broken 200 still parses and we can say what's missing
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

impl AccountsClient {
    pub fn new(client: Client, accounts_url: &str, client_id: &str, client_secret: &str) -> Self {
        let auth = format!("{}:{}", client_id, client_secret);
        let auth_header = format!("Basic {}", BASE64.encode(auth.as_bytes()));

        Self {
            client,
            token_url: format!("{}/api/token", accounts_url.trim_end_matches('/')),
            auth_header,
        }
    }
}

#[async_trait]
impl TokenExchanger for AccountsClient {
    async fn exchange(&self, grant: Grant<'_>) -> Result<TokenGrant, AuthError> {
        let mut form = vec![("grant_type", grant.grant_type())];
        if let Grant::RefreshToken(refresh_token) = grant {
            form.push(("refresh_token", refresh_token));
        }

        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", &self.auth_header)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
            let (code, description) = match parsed {
                Some(ErrorBody {
                    error: Some(code),
                    error_description,
                }) => (code, error_description),
                // not the documented error shape, hand back whatever we got
                _ => (
                    status.canonical_reason().unwrap_or("unknown").to_string(),
                    (!body.is_empty()).then_some(body),
                ),
            };
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                code,
                description,
            });
        }

        let raw: RawTokenResponse = response.json().await?;
        let access_token = raw.access_token.ok_or(AuthError::MissingAccessToken)?;

        Ok(TokenGrant {
            access_token,
            expires_in: raw.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            refresh_token: raw.refresh_token,
        })
    }
}
