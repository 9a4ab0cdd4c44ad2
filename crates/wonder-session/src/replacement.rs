//! Page replacement cache for fragment updates.
//!
//! Fragment ("Ajax") updates must not flood the primary backtrack cache,
//! yet links rendered inside an updated fragment still have to resolve.
//! The replacement cache keeps, per updating slot, only the latest
//! generations of the page.
//!
//! Two generations are kept by default because of a race: the server may
//! replace generation N-1 with N while the browser still shows the HTML of
//! N-1. A click on that HTML names context N-1, which must still resolve.
//! Once superseded, a record stays restorable for a grace period; a third
//! save for the same slot evicts it outright.

use std::sync::Arc;

use chrono::Duration;
use indexmap::IndexMap;
use tracing::{debug, trace};
use wonder_core::{Clock, ContextId, SessionCacheConfig};

use crate::record::{RecordSummary, TransactionRecord};

/// Bounded, insertion-ordered cache of fragment-update snapshots.
///
/// Keyed by context ID; records are grouped into slots by their composite
/// cache key.
pub struct PageReplacementCache<P> {
    records: IndexMap<ContextId, TransactionRecord<P>>,
    capacity: usize,
    generations: usize,
    grace: Duration,
    clock: Arc<dyn Clock>,
}

impl<P> std::fmt::Debug for PageReplacementCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReplacementCache")
            .field("len", &self.records.len())
            .field("capacity", &self.capacity)
            .field("generations", &self.generations)
            .field("grace", &self.grace)
            .finish()
    }
}

impl<P: Clone> PageReplacementCache<P> {
    /// Create a cache sized from the session configuration.
    pub fn from_config(config: &SessionCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.replacement_capacity(),
            config.generations_per_slot,
            config.grace_period(),
            clock,
        )
    }

    /// Create a cache with explicit limits.
    ///
    /// `generations` is clamped to at least 1.
    pub fn new(capacity: usize, generations: usize, grace: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: IndexMap::new(),
            capacity,
            generations: generations.max(1),
            grace,
            clock,
        }
    }

    /// Save a snapshot as the current generation of its slot.
    ///
    /// Ages the slot's existing records, drops records past their last
    /// generation or grace period, then evicts the oldest records while the
    /// cache is full. Returns `false` when the cache has no capacity.
    pub fn insert(&mut self, page: P, context_id: ContextId, cache_key: String) -> bool {
        if self.capacity == 0 {
            debug!(%context_id, "page replacement cache has no capacity");
            return false;
        }

        let now = self.clock.now();
        self.age_slot(&cache_key, now);

        // A re-save under the same context ID becomes the newest entry
        // rather than keeping its old position in the eviction order.
        self.records.shift_remove(&context_id);

        while self.records.len() >= self.capacity {
            if let Some((oldest, record)) = self.records.shift_remove_index(0) {
                debug!(
                    cache_key = %cache_key,
                    evicted = %oldest,
                    evicted_key = record.cache_key(),
                    "page replacement cache full, removing oldest entry"
                );
            }
        }

        debug!(%context_id, cache_key = %cache_key, "new page replacement context");
        let record = TransactionRecord::new(page, context_id.clone(), cache_key, now);
        self.records.insert(context_id, record);
        trace!(keys = ?self.records.keys().collect::<Vec<_>>(), "page replacement cache contents");
        true
    }

    /// Restore the page saved under exactly this context ID.
    ///
    /// An expired record is removed and reported as a miss.
    pub fn restore(&mut self, context_id: &ContextId) -> Option<P> {
        let now = self.clock.now();
        let expired = self.records.get(context_id)?.is_expired(now, self.grace);
        if expired {
            debug!(%context_id, "page replacement record expired");
            self.records.shift_remove(context_id);
            return None;
        }
        self.records.get(context_id).map(|record| record.page().clone())
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn remove_expired(&mut self) -> usize {
        let now = self.clock.now();
        let grace = self.grace;
        let before = self.records.len();
        self.records.retain(|_, record| {
            let expired = record.is_expired(now, grace);
            if expired {
                debug!(context_id = %record.context_id(), "deleting expired page record");
            }
            !expired
        });
        before - self.records.len()
    }

    fn age_slot(&mut self, cache_key: &str, now: chrono::DateTime<chrono::Utc>) {
        let grace = self.grace;
        let generations = self.generations;
        self.records.retain(|_, record| {
            if record.is_expired(now, grace) {
                debug!(context_id = %record.context_id(), "deleting expired page record");
                return false;
            }
            if record.cache_key() != cache_key {
                return true;
            }
            record.age(now);
            if record.generation() >= generations {
                debug!(cache_key, context_id = %record.context_id(), "removing old page");
                return false;
            }
            debug!(cache_key, context_id = %record.context_id(), "marking as old page");
            true
        });
    }
}

impl<P> PageReplacementCache<P> {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a record exists for this context ID (expired or not).
    pub fn contains(&self, context_id: &ContextId) -> bool {
        self.records.contains_key(context_id)
    }

    /// Record for a context ID.
    pub fn get(&self, context_id: &ContextId) -> Option<&TransactionRecord<P>> {
        self.records.get(context_id)
    }

    /// Records sharing a composite key, oldest first.
    pub fn records_for_slot<'a>(&'a self, cache_key: &'a str) -> impl Iterator<Item = &'a TransactionRecord<P>> + 'a {
        self.records
            .values()
            .filter(move |record| record.cache_key() == cache_key)
    }

    /// Context IDs in insertion order.
    pub fn context_ids(&self) -> impl Iterator<Item = &ContextId> {
        self.records.keys()
    }

    /// Summaries of all records, oldest first.
    pub fn snapshot(&self) -> Vec<RecordSummary> {
        let now = self.clock.now();
        self.records
            .values()
            .map(|record| record.summary(now, self.grace))
            .collect()
    }
}
