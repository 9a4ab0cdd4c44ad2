//! Session cache configuration.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix for environment variables read by [`SessionCacheConfig::from_env`].
pub const ENV_PREFIX: &str = "WONDER_";

/// Process-wide configuration for session page caching.
///
/// Read once at startup; caches never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCacheConfig {
    /// Whether fragment updates may use the page replacement cache at all.
    pub replacement_cache_enabled: bool,
    /// Number of logical slots the replacement cache is sized for.
    pub max_page_replacement_cache_size: usize,
    /// Live generations kept per slot key.
    pub generations_per_slot: usize,
    /// How long an old-generation record stays restorable, in seconds.
    pub replacement_grace_period_secs: u64,
    /// Primary backtrack cache capacity (0 disables it).
    pub page_cache_size: usize,
    /// Permanent page cache capacity (0 disables it).
    pub permanent_page_cache_size: usize,
    /// Whether the session routes saves between the permanent and primary caches itself.
    pub override_private_cache: bool,
    /// Whether a per-page info map is kept alongside cached pages.
    pub stores_page_info: bool,
}

impl Default for SessionCacheConfig {
    fn default() -> Self {
        Self {
            replacement_cache_enabled: true,
            max_page_replacement_cache_size: 30,
            generations_per_slot: 2,
            replacement_grace_period_secs: 5 * 60,
            page_cache_size: 30,
            permanent_page_cache_size: 30,
            override_private_cache: false,
            stores_page_info: false,
        }
    }
}

static GLOBAL: OnceLock<SessionCacheConfig> = OnceLock::new();

impl SessionCacheConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `WONDER_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::default().apply_lookup(|key| std::env::var(key).ok())
    }

    /// Override fields from a key lookup.
    ///
    /// Keys are `WONDER_` followed by the upper-cased field name, e.g.
    /// `WONDER_MAX_PAGE_REPLACEMENT_CACHE_SIZE`.
    pub fn apply_lookup<F>(mut self, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| {
            let key = format!("{}{}", ENV_PREFIX, field.to_uppercase());
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = get("replacement_cache_enabled") {
            self.replacement_cache_enabled = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("max_page_replacement_cache_size") {
            self.max_page_replacement_cache_size = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("generations_per_slot") {
            self.generations_per_slot = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("replacement_grace_period_secs") {
            self.replacement_grace_period_secs = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("page_cache_size") {
            self.page_cache_size = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("permanent_page_cache_size") {
            self.permanent_page_cache_size = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("override_private_cache") {
            self.override_private_cache = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("stores_page_info") {
            self.stores_page_info = parse_bool(&key, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// The process-wide configuration, read from the environment on first use.
    ///
    /// An unreadable environment falls back to the defaults.
    pub fn global() -> &'static SessionCacheConfig {
        GLOBAL.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring invalid session cache environment");
                Self::default()
            })
        })
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.generations_per_slot == 0 {
            return Err(CoreError::InvalidConfig {
                key: "generations_per_slot".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Total records the replacement cache may hold.
    pub fn replacement_capacity(&self) -> usize {
        self.max_page_replacement_cache_size
            .saturating_mul(self.generations_per_slot)
    }

    /// Grace period for old-generation records.
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.replacement_grace_period_secs.min((i64::MAX / 1000) as u64) as i64)
    }

    /// Whether the session owns permanent-cache routing.
    ///
    /// Keeping page info requires it.
    pub fn overrides_private_cache(&self) -> bool {
        self.override_private_cache || self.stores_page_info
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CoreError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" | "" => Ok(false),
        _ => Err(CoreError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value.trim().parse().map_err(|_| CoreError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}
