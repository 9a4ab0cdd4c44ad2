//! Session page caching for Ajax-heavy pages.
//!
//! This crate provides:
//! - `AjaxSession` - Per-session save/restore across three cache tiers
//! - `PageReplacementCache` - Two-generation cache for fragment updates
//! - `PermanentPageCache` - Fixed-size cache for always-resident pages
//! - `BacktrackCache` / `LruBacktrackCache` - The primary page history
//! - `SaveDirective` - Explicit save signals exchanged with the response layer
//!
//! # Example
//!
//! ```ignore
//! use wonder_core::{ContextId, SessionCacheConfig};
//! use wonder_session::{AjaxSession, RenderedPage, SaveDirective};
//!
//! let mut session = AjaxSession::new(SessionCacheConfig::default());
//!
//! // A fragment update for the "cart" region, anchored to context 3.
//! let directive = SaveDirective::fragment("cart").with_original_context_id("3");
//! session.save_page_with(RenderedPage::new("p1", "Main"), ContextId::new("4"), &directive);
//!
//! // A link rendered by that update resolves on the next click.
//! let restored = session.restore_page(&ContextId::new("4")).unwrap();
//! ```

mod backtrack;
mod directive;
mod page;
mod permanent;
mod record;
mod replacement;
mod session;
mod tier;

pub use backtrack::*;
pub use directive::*;
pub use page::*;
pub use permanent::*;
pub use record::*;
pub use replacement::*;
pub use session::*;
pub use tier::{first_hit, PageTier, Tier};
