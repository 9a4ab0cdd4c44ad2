//! Ordered cache tiers consulted on restore.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wonder_core::ContextId;

use crate::backtrack::BacktrackCache;
use crate::page::PageSnapshot;
use crate::permanent::PermanentPageCache;
use crate::replacement::PageReplacementCache;

/// Which cache satisfied a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Page replacement cache.
    Replacement,
    /// Permanent page cache.
    Permanent,
    /// Primary backtrack cache.
    Backtrack,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replacement => write!(f, "replacement"),
            Self::Permanent => write!(f, "permanent"),
            Self::Backtrack => write!(f, "backtrack"),
        }
    }
}

/// One lookup strategy in the restore chain.
pub trait PageTier<P> {
    /// Tier identity.
    fn tier(&self) -> Tier;

    /// Look up a page by context ID.
    fn restore(&mut self, context_id: &ContextId) -> Option<P>;
}

/// Consult tiers in order; the first hit wins.
pub fn first_hit<P>(tiers: &mut [&mut dyn PageTier<P>], context_id: &ContextId) -> Option<(Tier, P)> {
    tiers.iter_mut().find_map(|tier| {
        let name = tier.tier();
        tier.restore(context_id).map(|page| (name, page))
    })
}

/// The session's replacement cache, which exists only while it holds records.
pub(crate) struct ReplacementTier<'a, P>(pub(crate) &'a mut Option<PageReplacementCache<P>>);

impl<P: Clone> PageTier<P> for ReplacementTier<'_, P> {
    fn tier(&self) -> Tier {
        Tier::Replacement
    }

    // A miss probably means the user is done with Ajax on that page, so
    // expired records are swept and an empty cache is dropped.
    fn restore(&mut self, context_id: &ContextId) -> Option<P> {
        let cache = self.0.as_mut()?;
        if let Some(page) = cache.restore(context_id) {
            return Some(page);
        }

        debug!(%context_id, "no page in page replacement cache");
        cache.remove_expired();
        if cache.is_empty() {
            debug!("removing empty page replacement cache");
            *self.0 = None;
        }
        None
    }
}

/// Adapter exposing a [`BacktrackCache`] as a tier.
pub(crate) struct BacktrackTier<'a, B>(pub(crate) &'a mut B);

impl<P, B: BacktrackCache<P>> PageTier<P> for BacktrackTier<'_, B> {
    fn tier(&self) -> Tier {
        Tier::Backtrack
    }

    fn restore(&mut self, context_id: &ContextId) -> Option<P> {
        self.0.restore(context_id)
    }
}

impl<P: PageSnapshot> PageTier<P> for PermanentPageCache<P> {
    fn tier(&self) -> Tier {
        Tier::Permanent
    }

    fn restore(&mut self, context_id: &ContextId) -> Option<P> {
        PermanentPageCache::restore(self, context_id)
    }
}
