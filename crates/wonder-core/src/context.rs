//! Transaction identifiers and the request/response exchange they name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of one request/response exchange.
///
/// Pages are addressed by the context id of the response that rendered
/// them; a follow-up request names the page it targets by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    /// Create a context ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a context ID, rejecting blank input.
    pub fn parse(id: &str) -> Result<Self, CoreError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidContextId(id.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Deserialized IDs go through `parse`, so blank IDs never enter a cache.
impl<'de> Deserialize<'de> for ContextId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of one interactively updating region of a page.
///
/// Stable across that region's successive updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
    /// Create a slot key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SlotKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SlotKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of a page instance, independent of the contexts it was saved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a page ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Header map with case-insensitive names.
///
/// Names are stored lowercased; values are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_lowercase(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_lowercase())
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_lowercase())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no headers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One request/response exchange as seen by the session.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    /// Context ID assigned to the response being produced.
    pub context_id: ContextId,
    /// Context ID the request was addressed to (the sender page), if any.
    pub request_context_id: Option<ContextId>,
    /// Incoming request headers.
    pub request: Headers,
    /// Outgoing response headers.
    pub response: Headers,
    /// Response user-info, visible to the session but never sent to the client.
    pub user_info: HashMap<String, String>,
}

impl TransactionContext {
    /// Create a context for a fresh exchange.
    pub fn new(context_id: impl Into<ContextId>) -> Self {
        Self {
            context_id: context_id.into(),
            request_context_id: None,
            request: Headers::new(),
            response: Headers::new(),
            user_info: HashMap::new(),
        }
    }

    /// Set the context ID the request was addressed to.
    pub fn with_request_context_id(mut self, id: impl Into<ContextId>) -> Self {
        self.request_context_id = Some(id.into());
        self
    }

    /// Add a request header.
    pub fn with_request_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request.set(name, value);
        self
    }

    /// Add a response header.
    pub fn with_response_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.response.set(name, value);
        self
    }

    /// Add a response user-info entry.
    pub fn with_user_info(mut self, key: &str, value: impl Into<String>) -> Self {
        self.user_info.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_id_parse_trims() {
        let id = ContextId::parse("  12.3  ").unwrap();
        assert_eq!(id.as_str(), "12.3");
    }

    #[test]
    fn test_context_id_parse_rejects_blank() {
        assert!(matches!(
            ContextId::parse("   "),
            Err(CoreError::InvalidContextId(_))
        ));
        assert!(ContextId::parse("").is_err());
    }

    #[test]
    fn test_context_id_serialization() {
        let id = ContextId::new("7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""7""#);

        let back: ContextId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_context_id_deserialize_validates() {
        let trimmed: ContextId = serde_json::from_str(r#"" 8 ""#).unwrap();
        assert_eq!(trimmed, ContextId::new("8"));

        let err = serde_json::from_str::<ContextId>(r#""  ""#).unwrap_err();
        assert!(err.to_string().contains("invalid context id"));
    }

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Page_Cache_Key", "slot1");

        assert_eq!(headers.get("page_cache_key"), Some("slot1"));
        assert!(headers.contains("PAGE_CACHE_KEY"));
        assert_eq!(headers.remove("page_CACHE_key"), Some("slot1".to_string()));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_transaction_context_builder() {
        let ctx = TransactionContext::new("5")
            .with_request_context_id("4")
            .with_request_header("X-Test", "a")
            .with_response_header("X-Out", "b")
            .with_user_info("k", "v");

        assert_eq!(ctx.context_id.as_str(), "5");
        assert_eq!(ctx.request_context_id, Some(ContextId::new("4")));
        assert_eq!(ctx.request.get("x-test"), Some("a"));
        assert_eq!(ctx.response.get("x-out"), Some("b"));
        assert_eq!(ctx.user_info.get("k").map(String::as_str), Some("v"));
    }
}
