use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::funds::provider::{NavDataProvider, NavSeries, ProviderError, SchemeSummary};
use crate::types::NavPoint;

/// NAVs publish once a day, so a day-old copy is still current.
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    fetched_at: DateTime<Utc>,
    value: T,
}

/// Thread-safe key/value store whose entries expire after a fixed TTL.
#[derive(Debug, Clone)]
pub struct TtlCache<T: Clone> {
    entries: Arc<DashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Fresh value for `key`; an expired entry is evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if Utc::now() < entry.fetched_at + self.ttl {
            return Some(entry.value.clone());
        }
        drop(entry); // release the read lock before removing
        self.evict_expired(key, Utc::now());
        None
    }

    /// Remove `key` only if the entry held under the write lock is expired;
    /// a value refreshed since the read survives.
    fn evict_expired(&self, key: &str, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.remove_if(key, |_, e| now >= e.fetched_at + ttl);
    }

    pub fn insert(&self, key: &str, value: T) {
        self.insert_at(key, value, Utc::now());
    }

    fn insert_at(&self, key: &str, value: T, fetched_at: DateTime<Utc>) {
        self.entries
            .insert(key.to_string(), CacheEntry { fetched_at, value });
    }

    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now < e.fetched_at + ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wraps a provider and memoises successful responses for the TTL.
///
/// Failures are never cached, so a transient outage does not stick.
pub struct CachedNavProvider<P> {
    inner: P,
    searches: TtlCache<Vec<SchemeSummary>>,
    series: TtlCache<NavSeries>,
    latest: TtlCache<NavPoint>,
}

impl<P: NavDataProvider> CachedNavProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            searches: TtlCache::new(ttl),
            series: TtlCache::new(ttl),
            latest: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn clear(&self) {
        self.searches.entries.clear();
        self.series.entries.clear();
        self.latest.entries.clear();
    }
}

#[async_trait]
impl<P: NavDataProvider> NavDataProvider for CachedNavProvider<P> {
    async fn search_funds(&self, query: &str) -> Result<Vec<SchemeSummary>, ProviderError> {
        let key = query.trim().to_lowercase();
        if let Some(hit) = self.searches.get(&key) {
            tracing::debug!(query, "search cache hit");
            return Ok(hit);
        }
        let results = self.inner.search_funds(query).await?;
        self.searches.insert(&key, results.clone());
        Ok(results)
    }

    async fn fetch_nav_series(&self, scheme_id: &str) -> Result<NavSeries, ProviderError> {
        if let Some(hit) = self.series.get(scheme_id) {
            tracing::debug!(scheme_id, "NAV series cache hit");
            return Ok(hit);
        }
        let series = self.inner.fetch_nav_series(scheme_id).await?;
        self.series.insert(scheme_id, series.clone());
        Ok(series)
    }

    async fn fetch_latest_nav(&self, scheme_id: &str) -> Result<NavPoint, ProviderError> {
        if let Some(hit) = self.latest.get(scheme_id) {
            tracing::debug!(scheme_id, "latest NAV cache hit");
            return Ok(hit);
        }
        let point = self.inner.fetch_latest_nav(scheme_id).await?;
        self.latest.insert(scheme_id, point);
        Ok(point)
    }
}
