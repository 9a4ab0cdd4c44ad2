//! Per-session page saving and restoring.
//!
//! Fragment updates go to the page replacement cache so they do not push
//! foreground pages out of the backtrack cache. Restores consult the
//! replacement cache, then the permanent cache, then the backtrack cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use wonder_core::{Clock, ContextId, Headers, PageId, SessionCacheConfig, SystemClock, TransactionContext};

use crate::backtrack::{BacktrackCache, LruBacktrackCache};
use crate::directive::{signals, strip_response_signals, SaveDirective};
use crate::page::PageSnapshot;
use crate::permanent::PermanentPageCache;
use crate::replacement::PageReplacementCache;
use crate::tier::{first_hit, BacktrackTier, PageTier, ReplacementTier, Tier};

/// Free-form per-page information kept while the page is cached.
pub type PageInfo = HashMap<String, serde_json::Value>;

/// Where a save ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored in the primary backtrack cache.
    Backtrack,
    /// Stored in the page replacement cache under this composite key.
    Replacement {
        /// Composite slot key.
        composite_key: String,
    },
    /// Stored in the permanent cache.
    Permanent,
    /// Not retained beyond the current request.
    Skipped,
}

/// A page found by [`AjaxSession::restore_page`].
#[derive(Debug, Clone)]
pub struct RestoredPage<P> {
    /// The restored page.
    pub page: P,
    /// Tier that held it.
    pub tier: Tier,
    /// Context ID to carry as the original context ID on the next request.
    pub original_context_id: ContextId,
}

impl<P> RestoredPage<P> {
    /// Write the original-context-id signal for the next request.
    pub fn propagate(&self, headers: &mut Headers) {
        headers.set(signals::ORIGINAL_CONTEXT_ID, self.original_context_id.as_str());
    }
}

/// Page caches of one session.
///
/// Not synchronized: the host serializes requests per session.
pub struct AjaxSession<P, B = LruBacktrackCache<P>> {
    config: SessionCacheConfig,
    clock: Arc<dyn Clock>,
    replacement: Option<PageReplacementCache<P>>,
    permanent: PermanentPageCache<P>,
    backtrack: B,
    page_info: HashMap<PageId, PageInfo>,
}

impl<P: PageSnapshot> AjaxSession<P> {
    /// Create a session using the system clock.
    pub fn new(config: SessionCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a session from the process-wide configuration.
    pub fn from_global() -> Self {
        Self::new(SessionCacheConfig::global().clone())
    }

    /// Create a session with an injected clock.
    pub fn with_clock(config: SessionCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let backtrack = LruBacktrackCache::new(config.page_cache_size);
        Self::with_backtrack(config, clock, backtrack)
    }
}

impl<P: PageSnapshot, B: BacktrackCache<P>> AjaxSession<P, B> {
    /// Create a session around an existing backtrack cache.
    pub fn with_backtrack(config: SessionCacheConfig, clock: Arc<dyn Clock>, backtrack: B) -> Self {
        let permanent = PermanentPageCache::new(config.permanent_page_cache_size);
        Self {
            config,
            clock,
            replacement: None,
            permanent,
            backtrack,
            page_info: HashMap::new(),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionCacheConfig {
        &self.config
    }

    /// Save a page, reading the save signals off the transaction.
    ///
    /// After a replacement-cache save the session-only signals are removed
    /// from the response headers.
    pub fn save_page(&mut self, page: P, ctx: &mut TransactionContext) -> SaveOutcome {
        let directive = SaveDirective::from_context(ctx);
        let outcome = self.save_page_with(page, ctx.context_id.clone(), &directive);
        if matches!(outcome, SaveOutcome::Replacement { .. }) {
            strip_response_signals(&mut ctx.response);
        }
        outcome
    }

    /// Save a page as directed.
    pub fn save_page_with(&mut self, page: P, context_id: ContextId, directive: &SaveDirective) -> SaveOutcome {
        if !directive.bypasses_backtrack() {
            debug!(%context_id, "saving page in backtrack cache");
            self.backtrack.save(context_id, page);
            return SaveOutcome::Backtrack;
        }

        if !self.config.replacement_cache_enabled {
            debug!(%context_id, "page replacement cache disabled, saving page in backtrack cache");
            self.backtrack.save(context_id, page);
            return SaveOutcome::Backtrack;
        }

        debug!(%context_id, "considering page replacement cache");
        let Some(composite_key) = directive.composite_key() else {
            // A fragment response without a content update.
            debug!(%context_id, "not caching as no page cache key found");
            return SaveOutcome::Skipped;
        };

        let config = &self.config;
        let clock = &self.clock;
        let cache = self
            .replacement
            .get_or_insert_with(|| PageReplacementCache::from_config(config, Arc::clone(clock)));

        if cache.insert(page, context_id, composite_key.clone()) {
            SaveOutcome::Replacement { composite_key }
        } else {
            if cache.is_empty() {
                self.replacement = None;
            }
            SaveOutcome::Skipped
        }
    }

    /// Restore a page by context ID.
    pub fn restore_page(&mut self, context_id: &ContextId) -> Option<RestoredPage<P>> {
        debug!(%context_id, "restoring page");

        let mut replacement = ReplacementTier(&mut self.replacement);
        let mut backtrack = BacktrackTier(&mut self.backtrack);
        let mut tiers: Vec<&mut dyn PageTier<P>> = Vec::with_capacity(3);
        tiers.push(&mut replacement);
        if self.config.overrides_private_cache() {
            tiers.push(&mut self.permanent);
        }
        tiers.push(&mut backtrack);

        let (tier, page) = first_hit(&mut tiers, context_id)?;
        debug!(%context_id, %tier, page = page.name(), "restored page");
        Some(RestoredPage {
            page,
            tier,
            original_context_id: context_id.clone(),
        })
    }

    /// Restore the page a request targets and record it as the original
    /// context ID on the request.
    ///
    /// The target is the request's sender context ID; a request without one
    /// restores nothing.
    pub fn restore_page_for(&mut self, ctx: &mut TransactionContext) -> Option<RestoredPage<P>> {
        let context_id = ctx.request_context_id.clone()?;
        let restored = self.restore_page(&context_id)?;
        restored.propagate(&mut ctx.request);
        Some(restored)
    }

    /// Save the page produced by the current transaction.
    ///
    /// With private-cache override on, pages already in the permanent
    /// cache stay there: a page reached under a new context ID is aliased,
    /// and a page answering its own permanent request is saved permanently
    /// if it is permanent-cacheable. Everything else goes to
    /// [`save_page`](Self::save_page).
    pub fn save_current_page(&mut self, page: P, ctx: &mut TransactionContext) -> SaveOutcome {
        if !self.config.overrides_private_cache() {
            return self.save_page(page, ctx);
        }

        let context_id = ctx.context_id.clone();
        debug!(%context_id, "saving current page");

        let permanent_current = self.permanent.peek(&context_id).map(|p| p.page_id().clone());
        let permanent_sender = ctx
            .request_context_id
            .as_ref()
            .and_then(|id| self.permanent.peek(id))
            .map(|p| p.page_id().clone());

        if permanent_current.is_none() && self.permanent.contains_page(page.page_id()) {
            self.permanent.alias(context_id, page);
            return SaveOutcome::Permanent;
        }
        if permanent_current.as_ref() == Some(page.page_id()) {
            return SaveOutcome::Skipped;
        }
        if permanent_sender.as_ref() == Some(page.page_id()) && self.config.permanent_page_cache_size != 0 {
            if page.permanent_cacheable() {
                return self.save_page_in_permanent_cache(page, context_id);
            }
            return SaveOutcome::Skipped;
        }
        if self.config.page_cache_size != 0 {
            return self.save_page(page, ctx);
        }
        SaveOutcome::Skipped
    }

    /// Save a page in the permanent cache, dropping info of evicted pages.
    pub fn save_page_in_permanent_cache(&mut self, page: P, context_id: ContextId) -> SaveOutcome {
        if self.permanent.capacity() == 0 {
            return SaveOutcome::Skipped;
        }
        let evicted = self.permanent.save(context_id, page);
        if self.config.stores_page_info {
            for page in &evicted {
                self.page_info.remove(page.page_id());
            }
        }
        SaveOutcome::Permanent
    }

    /// Info recorded for a page.
    pub fn page_info(&self, page_id: &PageId) -> Option<&PageInfo> {
        self.page_info.get(page_id)
    }

    /// Info map for a page, created on first use.
    ///
    /// `None` unless the session stores page info.
    pub fn page_info_mut(&mut self, page_id: &PageId) -> Option<&mut PageInfo> {
        if !self.config.stores_page_info {
            return None;
        }
        Some(self.page_info.entry(page_id.clone()).or_default())
    }

    /// The replacement cache, if any fragment update is currently cached.
    pub fn replacement_cache(&self) -> Option<&PageReplacementCache<P>> {
        self.replacement.as_ref()
    }

    /// Whether a replacement cache currently exists.
    pub fn has_replacement_cache(&self) -> bool {
        self.replacement.is_some()
    }

    /// The permanent cache.
    pub fn permanent_cache(&self) -> &PermanentPageCache<P> {
        &self.permanent
    }

    /// The primary backtrack cache.
    pub fn backtrack_cache(&self) -> &B {
        &self.backtrack
    }
}
