use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use mixer_primitives::{hash_merge, Element};

pub use self::metrics::CacheMetrics;

mod metrics;

/// Types which can short-circuit the computation of `hash_merge([left, right])`
///
/// Both [`Tree`] and [`Accumulator`] route every internal node through a [`HashCache`]. An
/// implementation that returns anything other than [`hash_merge`] for a given pair produces roots
/// that no ledger will ever recognise, so take care when writing one.
///
/// [`Tree`]: crate::Tree
/// [`Accumulator`]: crate::Accumulator
pub trait HashCache: Sync + 'static {
    /// Calculate `hash_merge([left, right])`, possibly from memory
    fn hash(&self, left: Element, right: Element) -> Element {
        hash_merge([left, right])
    }
}

/// The default cache, which always calls [`hash_merge`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHashCache;

impl HashCache for NoopHashCache {}

/// A shared map from `(left, right)` to the merged hash
///
/// Cheap to clone: clones share the same map and the same [`CacheMetrics`]. Handy when the same
/// commitment list is rebuilt repeatedly, e.g. once per withdrawal attempt.
#[derive(Debug, Clone, Default)]
pub struct SimpleHashCache {
    inner: Arc<DashMap<(Element, Element), Element>>,
    metrics: CacheMetrics,
}

impl HashCache for SimpleHashCache {
    #[inline]
    fn hash(&self, left: Element, right: Element) -> Element {
        match self.inner.entry((left, right)) {
            Entry::Occupied(entry) => {
                self.metrics.record_hit();
                *entry.get()
            }
            Entry::Vacant(entry) => {
                self.metrics.record_miss();
                *entry.insert(hash_merge([left, right]))
            }
        }
    }
}

impl SimpleHashCache {
    /// Create a new, empty [`SimpleHashCache`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of hashes held in memory
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache holds no hashes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every remembered hash
    #[inline]
    pub fn evict_all(&self) {
        self.inner.clear();
    }

    /// Usage counters for this cache
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_cache_remembers_pairs() {
        let cache = SimpleHashCache::new();

        let first = cache.hash(Element::new(1), Element::new(2));
        cache.hash(Element::new(2), Element::new(1));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.metrics().cache_misses(), 2);
        assert_eq!(cache.metrics().cache_hits(), 0);

        let again = cache.hash(Element::new(1), Element::new(2));

        assert_eq!(first, again);
        assert_eq!(first, hash_merge([Element::new(1), Element::new(2)]));
        assert_eq!(cache.metrics().hashes(), 3);
        assert_eq!(cache.metrics().cache_hits(), 1);
    }

    #[test]
    fn clones_share_state() {
        let cache = SimpleHashCache::new();
        let clone = cache.clone();

        clone.hash(Element::ZERO, Element::ONE);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.metrics().hashes(), 1);

        cache.evict_all();
        assert!(clone.is_empty());
    }
}
