mod accounts;
mod credential;
mod store;
mod traits;

pub use accounts::{AccountsClient, DEFAULT_ACCOUNTS_URL};
pub use store::TokenStore;
pub use traits::CredentialKind;

use crate::clock::Clock;
use reqwest::Client;
use std::sync::Arc;

/// What we need to talk to the accounts service
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub accounts_url: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // secrets stay out of logs
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("accounts_url", &self.accounts_url)
            .finish_non_exhaustive()
    }
}

/// Wire the real accounts client into a token store
pub fn token_store(
    http: Client,
    credentials: &SpotifyCredentials,
    clock: Arc<dyn Clock>,
) -> TokenStore {
    let exchanger = Arc::new(AccountsClient::new(
        http,
        &credentials.accounts_url,
        &credentials.client_id,
        &credentials.client_secret,
    ));

    TokenStore::new(exchanger, clock, credentials.refresh_token.clone())
}
