use super::error::AppError;
use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::spotify::{ApiRequest, Gateway};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a shaped response gets cached
pub struct CacheSlot<'a> {
    pub cache: &'a ResponseCache<Value>,
    pub key: String,
}

/// fetch -> shape -> cache, the one path every read endpoint goes through
pub struct Fetch<'a> {
    request: ApiRequest,
    cache: Option<CacheSlot<'a>>,
    force: bool,
}

impl<'a> Fetch<'a> {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            cache: None,
            force: false,
        }
    }

    pub fn cached(mut self, cache: &'a ResponseCache<Value>, key: String) -> Self {
        self.cache = Some(CacheSlot { cache, key });
        self
    }

    /// skip the cache lookup (the fresh result still gets stored)
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub async fn run<U, O, F>(self, gateway: &Gateway, shape: F) -> Result<Value, AppError>
    where
        U: DeserializeOwned,
        O: Serialize,
        F: FnOnce(U) -> O,
    {
        if let (Some(slot), false) = (&self.cache, self.force) {
            if let Some(hit) = slot.cache.get(&slot.key).await {
                tracing::debug!("{} cache hit: {}", slot.cache.name(), slot.key);
                return Ok(hit);
            }
            tracing::debug!("{} cache miss: {}", slot.cache.name(), slot.key);
        }

        let upstream: U = gateway.fetch(self.request).await?;
        let shaped = serde_json::to_value(shape(upstream)).map_err(ApiError::from)?;

        if let Some(slot) = self.cache {
            slot.cache.insert(slot.key, shaped.clone()).await;
        }

        Ok(shaped)
    }
}
