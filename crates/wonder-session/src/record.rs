//! Replacement-cache transaction records.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use wonder_core::ContextId;

/// One page snapshot saved by a fragment update.
#[derive(Debug, Clone)]
pub struct TransactionRecord<P> {
    page: P,
    context_id: ContextId,
    cache_key: String,
    generation: usize,
    last_touched_at: DateTime<Utc>,
}

impl<P> TransactionRecord<P> {
    /// Create a current-generation record.
    pub fn new(page: P, context_id: ContextId, cache_key: String, now: DateTime<Utc>) -> Self {
        Self {
            page,
            context_id,
            cache_key,
            generation: 0,
            last_touched_at: now,
        }
    }

    /// The saved page.
    pub fn page(&self) -> &P {
        &self.page
    }

    /// Context ID this snapshot was produced for.
    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    /// Composite slot key.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Generations superseded since this record was saved (0 = current).
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Whether a newer save for the same slot exists.
    pub fn is_old_generation(&self) -> bool {
        self.generation > 0
    }

    /// Last time this record was created or became old.
    pub fn last_touched_at(&self) -> DateTime<Utc> {
        self.last_touched_at
    }

    /// Move one generation back. Becoming old starts the grace period.
    pub fn age(&mut self, now: DateTime<Utc>) {
        if self.generation == 0 {
            self.last_touched_at = now;
        }
        self.generation += 1;
    }

    /// Old and untouched for longer than `grace`.
    pub fn is_expired(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.is_old_generation() && now - self.last_touched_at > grace
    }

    /// Serializable view for diagnostics.
    pub fn summary(&self, now: DateTime<Utc>, grace: Duration) -> RecordSummary {
        RecordSummary {
            context_id: self.context_id.clone(),
            cache_key: self.cache_key.clone(),
            generation: self.generation,
            old_generation: self.is_old_generation(),
            last_touched_at: self.last_touched_at,
            expired: self.is_expired(now, grace),
        }
    }
}

/// Snapshot of a record without its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    /// Context ID.
    pub context_id: ContextId,
    /// Composite slot key.
    pub cache_key: String,
    /// Generation counter.
    pub generation: usize,
    /// Whether the record is old-generation.
    pub old_generation: bool,
    /// Last touch.
    pub last_touched_at: DateTime<Utc>,
    /// Whether the grace period has run out.
    pub expired: bool,
}
