//! Save directives exchanged between the response layer and the session.
//!
//! The response layer and the session never share types; they agree only on
//! the string keys in [`signals`]. [`SaveDirective`] is the typed view of
//! those keys that the session acts on.

use serde::{Deserialize, Serialize};
use wonder_core::{ContextId, Headers, SlotKey, TransactionContext};

/// String keys shared with the response layer.
pub mod signals {
    /// Marker: do not store this page in the primary backtrack cache.
    pub const DONT_STORE_PAGE: &str = "erxsession.dont_store_page";
    /// Marker: store this page in the primary cache even if told not to.
    pub const FORCE_STORE_PAGE: &str = "erxsession.force_store_page";
    /// Slot key of the fragment that produced this save.
    pub const PAGE_CACHE_KEY: &str = "page_cache_key";
    /// Context ID of the first request in an Ajax sequence.
    pub const ORIGINAL_CONTEXT_ID: &str = "original_context_id";
}

/// Where a save should go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreMode {
    /// Normal save into the primary backtrack cache.
    #[default]
    Default,
    /// Keep out of the primary cache; consider the replacement cache.
    DontStore,
    /// Primary cache regardless of any other marker.
    ForceStore,
}

/// Typed save signals for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDirective {
    /// Store marker.
    #[serde(default)]
    pub store: StoreMode,
    /// Slot key of the fragment being updated.
    #[serde(default)]
    pub slot_key: Option<SlotKey>,
    /// Context ID anchoring this Ajax sequence.
    #[serde(default)]
    pub original_context_id: Option<ContextId>,
}

impl SaveDirective {
    /// A plain page save.
    pub fn backtrack() -> Self {
        Self::default()
    }

    /// A fragment update for the given slot.
    pub fn fragment(slot_key: impl Into<SlotKey>) -> Self {
        Self {
            store: StoreMode::DontStore,
            slot_key: Some(slot_key.into()),
            original_context_id: None,
        }
    }

    /// A response that must not be stored and names no slot.
    pub fn dont_store() -> Self {
        Self {
            store: StoreMode::DontStore,
            ..Self::default()
        }
    }

    /// Anchor this save to an original context ID.
    pub fn with_original_context_id(mut self, id: impl Into<ContextId>) -> Self {
        self.original_context_id = Some(id.into());
        self
    }

    /// Force a primary-cache save.
    pub fn forced(mut self) -> Self {
        self.store = StoreMode::ForceStore;
        self
    }

    /// Read the signals off a transaction.
    ///
    /// The store marker is looked up in the response user-info, then the
    /// response headers, then the request headers. The slot key prefers the
    /// response over the request. The original context ID only ever
    /// travels on the request.
    pub fn from_context(ctx: &TransactionContext) -> Self {
        let has_marker = |key: &str| {
            ctx.user_info.contains_key(key) || ctx.response.contains(key) || ctx.request.contains(key)
        };

        let store = if has_marker(signals::FORCE_STORE_PAGE) {
            StoreMode::ForceStore
        } else if has_marker(signals::DONT_STORE_PAGE) {
            StoreMode::DontStore
        } else {
            StoreMode::Default
        };

        let slot_key = ctx
            .response
            .get(signals::PAGE_CACHE_KEY)
            .or_else(|| ctx.request.get(signals::PAGE_CACHE_KEY))
            .map(SlotKey::from);

        let original_context_id = ctx
            .request
            .get(signals::ORIGINAL_CONTEXT_ID)
            .map(ContextId::from);

        Self {
            store,
            slot_key,
            original_context_id,
        }
    }

    /// Whether this save should stay out of the primary cache.
    pub fn bypasses_backtrack(&self) -> bool {
        self.store == StoreMode::DontStore
    }

    /// Composite replacement-cache key: `<original context id>_<slot key>`.
    ///
    /// `None` when no slot key was given. A missing original ID leaves the
    /// prefix empty, so all such saves of a slot still share one key.
    pub fn composite_key(&self) -> Option<String> {
        let slot = self.slot_key.as_ref()?;
        let original = self
            .original_context_id
            .as_ref()
            .map(ContextId::as_str)
            .unwrap_or_default();
        Some(format!("{}_{}", original, slot))
    }
}

/// Remove session-only signals from a client-bound response.
pub fn strip_response_signals(headers: &mut Headers) {
    headers.remove(signals::PAGE_CACHE_KEY);
    headers.remove(signals::DONT_STORE_PAGE);
    headers.remove(signals::FORCE_STORE_PAGE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_context_plain_request() {
        let ctx = TransactionContext::new("2");
        let directive = SaveDirective::from_context(&ctx);

        assert_eq!(directive, SaveDirective::backtrack());
        assert!(!directive.bypasses_backtrack());
        assert_eq!(directive.composite_key(), None);
    }

    #[test]
    fn test_from_context_marker_in_user_info() {
        let ctx = TransactionContext::new("2").with_user_info(signals::DONT_STORE_PAGE, "1");
        assert_eq!(SaveDirective::from_context(&ctx).store, StoreMode::DontStore);
    }

    #[test]
    fn test_from_context_marker_in_request_header() {
        let ctx = TransactionContext::new("2").with_request_header(signals::DONT_STORE_PAGE, "x");
        assert!(SaveDirective::from_context(&ctx).bypasses_backtrack());
    }

    #[test]
    fn test_force_store_overrides_dont_store() {
        let ctx = TransactionContext::new("2")
            .with_response_header(signals::DONT_STORE_PAGE, "1")
            .with_user_info(signals::FORCE_STORE_PAGE, "1");
        let directive = SaveDirective::from_context(&ctx);

        assert_eq!(directive.store, StoreMode::ForceStore);
        assert!(!directive.bypasses_backtrack());
    }

    #[test]
    fn test_slot_key_prefers_response() {
        let ctx = TransactionContext::new("2")
            .with_request_header(signals::PAGE_CACHE_KEY, "from-request")
            .with_response_header(signals::PAGE_CACHE_KEY, "from-response");
        let directive = SaveDirective::from_context(&ctx);

        assert_eq!(directive.slot_key, Some(SlotKey::new("from-response")));
    }

    #[test]
    fn test_slot_key_falls_back_to_request() {
        let ctx = TransactionContext::new("2").with_request_header(signals::PAGE_CACHE_KEY, "cart");
        assert_eq!(SaveDirective::from_context(&ctx).slot_key, Some(SlotKey::new("cart")));
    }

    #[test]
    fn test_composite_key() {
        let directive = SaveDirective::fragment("cart").with_original_context_id("7");
        assert_eq!(directive.composite_key().as_deref(), Some("7_cart"));
    }

    #[test]
    fn test_composite_key_without_original() {
        let directive = SaveDirective::fragment("cart");
        assert_eq!(directive.composite_key().as_deref(), Some("_cart"));
    }

    #[test]
    fn test_strip_response_signals() {
        let mut headers = Headers::new()
            .with(signals::PAGE_CACHE_KEY, "cart")
            .with(signals::DONT_STORE_PAGE, "1")
            .with("content-type", "text/html");

        strip_response_signals(&mut headers);

        assert!(!headers.contains(signals::PAGE_CACHE_KEY));
        assert!(!headers.contains(signals::DONT_STORE_PAGE));
        assert_eq!(headers.get("Content-Type"), Some("text/html"));
    }
}
