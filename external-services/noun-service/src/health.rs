//! Debounced backend liveness probe

use moka::future::Cache;
use std::future::Future;
use std::time::Duration;

/// Reuses a probe outcome for a fixed TTL.
///
/// Concurrent callers arriving while a probe is in flight wait for that
/// probe instead of starting their own.
#[derive(Clone)]
pub struct HealthCache {
    cache: Option<Cache<(), bool>>,
    ttl: Duration,
}

impl HealthCache {
    /// A zero TTL disables caching
    pub fn new(ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| Cache::builder().max_capacity(1).time_to_live(ttl).build());
        Self { cache, ttl }
    }

    pub async fn get_or_probe<F>(&self, probe: F) -> bool
    where
        F: Future<Output = bool>,
    {
        match &self.cache {
            Some(cache) => cache.get_with((), probe).await,
            None => probe.await,
        }
    }

    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&()).await;
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
