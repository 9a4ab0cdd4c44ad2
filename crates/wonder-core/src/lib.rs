//! Core abstractions for Wonder session page caching.
//!
//! This crate provides the fundamental types shared by the session layer
//! and its tools:
//! - `ContextId` / `SlotKey` / `PageId` - Typed identifiers
//! - `Headers` / `TransactionContext` - One request/response exchange
//! - `Clock` - Injectable time source (`SystemClock`, `ManualClock`)
//! - `SessionCacheConfig` - Process-wide cache configuration

mod clock;
mod config;
mod context;
mod error;

pub use clock::*;
pub use config::*;
pub use context::*;
pub use error::*;
