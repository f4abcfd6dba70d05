use super::traits::TokenGrant;
use chrono::{DateTime, Duration, Utc};

/// safety margin before literal expiry. tokens inside it count as stale so a
/// call never leaves with a token that dies mid-flight
pub const EXPIRY_SKEW_SECS: i64 = 60;

// anything longer than this from the accounts service is nonsense, clamp it
const MAX_LIFETIME_SECS: u64 = 60 * 60 * 24 * 365;

/// One bearer credential and when it stops being usable.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// user credential only
    pub refresh_token: Option<String>,
}

impl Credential {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_refresh_token(refresh_token: String) -> Self {
        Self {
            refresh_token: Some(refresh_token),
            ..Self::default()
        }
    }

    /// the token, if it is still good at `now`
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let expires_at = self.expires_at?;
        if now < expires_at - Duration::seconds(EXPIRY_SKEW_SECS) {
            self.access_token.as_deref()
        } else {
            None
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.valid_token(now).is_some()
    }

    /// Overwrite with a fresh grant. A rotated refresh token replaces the old one,
    /// otherwise the old one stays.
    pub fn apply(&mut self, grant: TokenGrant, now: DateTime<Utc>) {
        let lifetime = grant.expires_in.min(MAX_LIFETIME_SECS) as i64;
        self.access_token = Some(grant.access_token);
        self.expires_at = Some(now + Duration::seconds(lifetime));
        if let Some(rotated) = grant.refresh_token {
            self.refresh_token = Some(rotated);
        }
    }
}
