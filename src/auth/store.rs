use super::credential::Credential;
use super::traits::{CredentialKind, Grant, TokenExchanger};
use crate::clock::Clock;
use crate::error::AuthError;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snapshot of one credential for the status page. Never includes the token.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub kind: String,
    /// an exchange is in flight, nothing else is known right now
    pub refreshing: bool,
    pub valid: bool,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Holds the user and client credentials and refreshes them on demand.
///
/// Each credential sits behind its own async mutex which stays locked for the
/// whole exchange. Callers that show up while a refresh is in flight wait on
/// the lock and then find a fresh token, so there's only ever one exchange per
/// credential at a time. That matters for the refresh flow: two parallel
/// refreshes that both rotate the refresh token would leave us holding the
/// one the accounts service already forgot about.
pub struct TokenStore {
    exchanger: Arc<dyn TokenExchanger + Send + Sync>,
    clock: Arc<dyn Clock>,
    user: Mutex<Credential>,
    client: Mutex<Credential>,
}

impl TokenStore {
    pub fn new(
        exchanger: Arc<dyn TokenExchanger + Send + Sync>,
        clock: Arc<dyn Clock>,
        refresh_token: String,
    ) -> Self {
        Self {
            exchanger,
            clock,
            user: Mutex::new(Credential::with_refresh_token(refresh_token)),
            client: Mutex::new(Credential::empty()),
        }
    }

    pub async fn token(&self, kind: CredentialKind) -> Result<String, AuthError> {
        match kind {
            CredentialKind::User => self.user_token().await,
            CredentialKind::Client => self.client_token().await,
        }
    }

    /// Bearer token acting on behalf of the account owner
    pub async fn user_token(&self) -> Result<String, AuthError> {
        let mut cred = self.user.lock().await;
        if let Some(token) = cred.valid_token(self.clock.now()) {
            return Ok(token.to_string());
        }

        // always Some, TokenStore::new seeds it and apply never clears it
        let refresh_token = cred.refresh_token.clone().unwrap_or_default();

        tracing::info!("Refreshing user access token");
        let grant = self
            .exchanger
            .exchange(Grant::RefreshToken(&refresh_token))
            .await?;

        if grant.refresh_token.is_some() {
            tracing::info!("Accounts service rotated the refresh token");
        }

        cred.apply(grant, self.clock.now());
        Ok(cred.access_token.clone().unwrap_or_default())
    }

    /// Bearer token for public catalogue data
    pub async fn client_token(&self) -> Result<String, AuthError> {
        let mut cred = self.client.lock().await;
        if let Some(token) = cred.valid_token(self.clock.now()) {
            return Ok(token.to_string());
        }

        tracing::info!("Requesting client credentials access token");
        let mut grant = self.exchanger.exchange(Grant::ClientCredentials).await?;
        // nothing to rotate in this flow
        grant.refresh_token = None;

        cred.apply(grant, self.clock.now());
        Ok(cred.access_token.clone().unwrap_or_default())
    }

    /// Never waits: a credential whose lock is held is mid-exchange and gets
    /// reported as refreshing.
    pub fn status(&self) -> Vec<CredentialStatus> {
        let now = self.clock.now();
        [
            (CredentialKind::User, &self.user),
            (CredentialKind::Client, &self.client),
        ]
        .into_iter()
        .map(|(kind, slot)| match slot.try_lock() {
            Ok(cred) => CredentialStatus {
                kind: kind.to_string(),
                refreshing: false,
                valid: cred.is_valid(now),
                expires_at: cred.expires_at,
            },
            Err(_) => CredentialStatus {
                kind: kind.to_string(),
                refreshing: true,
                valid: false,
                expires_at: None,
            },
        })
        .collect()
    }
}
