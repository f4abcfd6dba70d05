use crate::error::AuthError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Which of the two credentials a call needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// refresh-token flow, acts on behalf of the account owner
    User,
    /// client-credentials flow, public catalogue data only
    Client,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::User => write!(f, "user"),
            CredentialKind::Client => write!(f, "client"),
        }
    }
}

/// The grant sent to the token endpoint
#[derive(Debug, Clone, Copy)]
pub enum Grant<'a> {
    RefreshToken(&'a str),
    ClientCredentials,
}

impl Grant<'_> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::RefreshToken(_) => "refresh_token",
            Grant::ClientCredentials => "client_credentials",
        }
    }
}

/// What a successful exchange hands back
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// seconds
    pub expires_in: u64,
    /// only some refreshes rotate it
    pub refresh_token: Option<String>,
}

#[async_trait]
pub trait TokenExchanger {
    async fn exchange(&self, grant: Grant<'_>) -> Result<TokenGrant, AuthError>;
}
