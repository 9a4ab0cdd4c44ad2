//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wonder_core::SessionCacheConfig;

/// File names searched for, in order, from the working directory upwards.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["wonder.toml", ".wonder.toml", "wonder.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Session cache settings.
    #[serde(default)]
    pub session: SessionCacheConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config content; the format follows the file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        let config: Self = if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };

        config
            .session
            .validate()
            .with_context(|| format!("Invalid session settings in {}", path))?;
        Ok(config)
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Apply `WONDER_*` environment overrides on top of the file settings.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.session = self
            .session
            .apply_lookup(lookup)
            .context("Invalid session settings in environment")?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = CliConfig::parse(
            "wonder.toml",
            r#"
            [session]
            max_page_replacement_cache_size = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.session.max_page_replacement_cache_size, 4);
        assert_eq!(config.session.page_cache_size, 30);
    }

    #[test]
    fn test_parse_json() {
        let config =
            CliConfig::parse("wonder.json", r#"{"session": {"stores_page_info": true}}"#).unwrap();
        assert!(config.session.stores_page_info);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = CliConfig::parse("wonder.toml", "").unwrap();
        assert_eq!(config.session, SessionCacheConfig::default());
    }

    #[test]
    fn test_parse_rejects_invalid_session() {
        let err = CliConfig::parse("wonder.toml", "[session]\ngenerations_per_slot = 0").unwrap_err();
        assert!(format!("{:#}", err).contains("generations_per_slot"));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = CliConfig::default()
            .with_env_overrides(|key| {
                (key == "WONDER_PAGE_CACHE_SIZE").then(|| "7".to_string())
            })
            .unwrap();
        assert_eq!(config.session.page_cache_size, 7);
    }
}
