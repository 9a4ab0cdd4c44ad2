//! Permanent page cache for always-resident pages.

use std::collections::{HashMap, VecDeque};

use tracing::debug;
use wonder_core::{ContextId, PageId};

use crate::page::PageSnapshot;

/// Fixed-size cache of pages that stay resident across requests.
///
/// Explicit saves are evicted oldest-first once `capacity` is reached.
/// Aliases (the same page reached under a further context ID) do not count
/// toward capacity and leave together with the page they point at.
#[derive(Debug)]
pub struct PermanentPageCache<P> {
    pages: HashMap<ContextId, P>,
    order: VecDeque<ContextId>,
    capacity: usize,
}

impl<P: PageSnapshot> PermanentPageCache<P> {
    /// Create a cache holding up to `capacity` explicit saves.
    pub fn new(capacity: usize) -> Self {
        Self {
            pages: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Save a page, evicting the oldest saves while full.
    ///
    /// Returns the evicted pages. A zero-capacity cache stores nothing.
    pub fn save(&mut self, context_id: ContextId, page: P) -> Vec<P> {
        if self.capacity == 0 {
            return Vec::new();
        }

        let mut evicted = Vec::new();
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(page) = self.pages.remove(&oldest) {
                let page_id = page.page_id().clone();
                self.pages.retain(|_, p| p.page_id() != &page_id);
                debug!(context_id = %oldest, page = page.name(), "evicting permanent page");
                evicted.push(page);
            }
        }

        debug!(%context_id, page = page.name(), "saving page in permanent cache");
        self.pages.insert(context_id.clone(), page);
        if !self.order.contains(&context_id) {
            self.order.push_back(context_id);
        }
        evicted
    }

    /// Register a page already held here under another context ID.
    pub fn alias(&mut self, context_id: ContextId, page: P) {
        debug!(%context_id, page = page.name(), "aliasing permanent page");
        self.pages.insert(context_id, page);
    }

    /// Look up a page by context ID.
    pub fn restore(&self, context_id: &ContextId) -> Option<P> {
        self.pages.get(context_id).cloned()
    }

    /// Borrow a page by context ID.
    pub fn peek(&self, context_id: &ContextId) -> Option<&P> {
        self.pages.get(context_id)
    }

    /// Whether this page instance is held under any context ID.
    pub fn contains_page(&self, page_id: &PageId) -> bool {
        self.pages.values().any(|p| p.page_id() == page_id)
    }

    /// Number of context IDs (saves and aliases).
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Maximum number of explicit saves.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
