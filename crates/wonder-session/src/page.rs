//! Page snapshots held by the caches.

use serde::{Deserialize, Serialize};
use wonder_core::PageId;

/// A rendered page that can be cached and later re-entered.
///
/// Caches clone snapshots on restore, so implementors holding large
/// component trees usually wrap them in an `Arc`.
pub trait PageSnapshot: Clone {
    /// Identity of the page instance.
    fn page_id(&self) -> &PageId;

    /// Human-readable page name, used in logs.
    fn name(&self) -> &str;

    /// Whether this page may live in the permanent cache.
    fn permanent_cacheable(&self) -> bool {
        true
    }
}

/// A plain rendered page with its component children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// Page instance identity.
    pub id: PageId,
    /// Page name.
    pub name: String,
    /// Rendered content.
    #[serde(default)]
    pub content: String,
    /// Whether this component manages its own single permanent instance.
    #[serde(default)]
    pub permanent_singleton: bool,
    /// Nested components.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedPage>,
}

impl RenderedPage {
    /// Create a page with no content.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PageId::new(id),
            name: name.into(),
            content: String::new(),
            permanent_singleton: false,
            children: Vec::new(),
        }
    }

    /// Set the rendered content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Add a nested component.
    pub fn with_child(mut self, child: RenderedPage) -> Self {
        self.children.push(child);
        self
    }

    /// Mark as a self-managed permanent singleton.
    pub fn singleton(mut self) -> Self {
        self.permanent_singleton = true;
        self
    }
}

impl PageSnapshot for RenderedPage {
    fn page_id(&self) -> &PageId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    // A singleton anywhere in the tree keeps the whole page out.
    fn permanent_cacheable(&self) -> bool {
        !self.permanent_singleton && self.children.iter().all(|c| c.permanent_cacheable())
    }
}
