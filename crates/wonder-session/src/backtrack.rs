//! Primary backtrack cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;
use wonder_core::ContextId;

/// The primary page history, one entry per user-backtrackable request.
pub trait BacktrackCache<P> {
    /// Store a page under its context ID.
    fn save(&mut self, context_id: ContextId, page: P);

    /// Look up a page by context ID.
    fn restore(&mut self, context_id: &ContextId) -> Option<P>;

    /// Number of cached pages.
    fn len(&self) -> usize;

    /// Whether no pages are cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// LRU backtrack cache. A capacity of 0 disables it.
#[derive(Debug)]
pub struct LruBacktrackCache<P> {
    inner: Option<LruCache<ContextId, P>>,
}

impl<P> LruBacktrackCache<P> {
    /// Create a cache holding up to `capacity` pages.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Whether the cache can store anything.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl<P: Clone> BacktrackCache<P> for LruBacktrackCache<P> {
    fn save(&mut self, context_id: ContextId, page: P) {
        match self.inner.as_mut() {
            Some(cache) => {
                if let Some((displaced, _)) = cache.push(context_id, page) {
                    trace!(context_id = %displaced, "backtrack cache displaced page");
                }
            }
            None => trace!(%context_id, "backtrack cache disabled, dropping page"),
        }
    }

    fn restore(&mut self, context_id: &ContextId) -> Option<P> {
        self.inner.as_mut()?.get(context_id).cloned()
    }

    fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, LruCache::len)
    }
}
