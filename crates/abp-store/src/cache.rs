//! Short-TTL lookup cache, keyed by `(query_domain, want_whitelist)`.
//!
//! Backed by `moka::sync::Cache`, which is safe for concurrent reads and
//! writes without an external lock, satisfying spec §5's "reader-safe
//! cache" requirement directly rather than needing a `RwLock` wrapper.

use std::sync::Arc;
use std::time::Duration;

use abp_core::UrlFilter;
use moka::sync::Cache;

/// Tunable cache parameters. Currently just the entry TTL.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        // 10 minutes, per spec §4.6.
        Self { ttl: Duration::from_secs(600) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    domain: String,
    want_whitelist: bool,
}

pub struct LookupCache {
    inner: Cache<CacheKey, Arc<Vec<UrlFilter>>>,
}

impl LookupCache {
    pub fn new(options: CacheOptions) -> Self {
        let inner = Cache::builder().time_to_live(options.ttl).build();
        Self { inner }
    }

    pub fn get(&self, domain: &str, want_whitelist: bool) -> Option<Arc<Vec<UrlFilter>>> {
        let key = CacheKey { domain: domain.to_string(), want_whitelist };
        self.inner.get(&key)
    }

    pub fn insert(&self, domain: &str, want_whitelist: bool, filters: Arc<Vec<UrlFilter>>) {
        let key = CacheKey { domain: domain.to_string(), want_whitelist };
        self.inner.insert(key, filters);
    }

    /// Drop every cached entry. Called on every `ingest`, since freshly
    /// ingested rules invalidate any previously materialised result list.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
