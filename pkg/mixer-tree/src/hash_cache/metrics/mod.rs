use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Counters describing how a [`SimpleHashCache`] has been used
///
/// Clones share the same counters.
///
/// [`SimpleHashCache`]: crate::hash_cache::SimpleHashCache
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hashes: Arc<AtomicUsize>,
    cache_hits: Arc<AtomicUsize>,
    cache_misses: Arc<AtomicUsize>,
}

impl CacheMetrics {
    /// The number of node hashes requested from the cache
    #[inline]
    #[must_use]
    pub fn hashes(&self) -> usize {
        self.hashes.load(Ordering::Relaxed)
    }

    /// The number of requests answered from memory
    #[inline]
    #[must_use]
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// The number of requests that had to run the hash function
    #[inline]
    #[must_use]
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub(crate) fn record_hit(&self) {
        self.hashes.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.hashes.fetch_add(1, Ordering::Relaxed);
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }
}
