use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// entries past which an insert triggers a sweep of expired entries
pub const SEARCH_CACHE_CAPACITY: usize = 100;
pub const TRACK_CACHE_CAPACITY: usize = 200;

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// In-memory TTL cache (doesn't persist).
///
/// Size is bounded best-effort only: once the map grows past `capacity`, the
/// next insert drops every expired entry. Live entries are never evicted, so a
/// burst of distinct keys inside one TTL window can still push it over.
pub struct ResponseCache<T> {
    name: &'static str,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    capacity: usize,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(
        name: &'static str,
        capacity: usize,
        default_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            capacity,
            default_ttl,
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        // expired entries hang around until the next sweep but are never served
        (self.clock.now() < entry.expires_at).then(|| entry.value.clone())
    }

    pub async fn put(&self, key: String, value: T, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        {
            let mut entries = self.entries.write().await;
            entries.insert(key, CacheEntry { value, expires_at });
        }
        self.maybe_evict().await;
    }

    /// put with this cache's default ttl
    pub async fn insert(&self, key: String, value: T) {
        self.put(key, value, self.default_ttl).await;
    }

    /// drop expired entries, but only once we're over capacity
    pub async fn maybe_evict(&self) {
        let mut entries = self.entries.write().await;
        if entries.len() <= self.capacity {
            return;
        }

        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);

        tracing::debug!(
            "{} cache swept {} expired entries ({} left)",
            self.name,
            before - entries.len(),
            entries.len()
        );
    }

    /// current count, expired stragglers included (for the status page)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Key for a search. Query text is trimmed, whitespace-collapsed and lowercased
/// so "Daft  Punk" and "daft punk" land on the same entry. The free-form text
/// goes last so the fixed fields can't bleed into it.
pub fn search_key(query: &str, limit: u32, market: Option<&str>) -> String {
    format!(
        "search|{}|{}|{}",
        limit,
        market.unwrap_or("-"),
        normalize_query(query)
    )
}

/// trimmed, whitespace-collapsed, lowercased
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn track_key(id: &str) -> String {
    format!("track|{}", id)
}
