//! Core error types.

use thiserror::Error;

/// Errors raised while building identifiers or loading configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A context identifier was empty or blank.
    #[error("invalid context id: {0:?}")]
    InvalidContextId(String),

    /// A configuration value could not be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    InvalidConfig {
        /// Configuration key.
        key: String,
        /// Offending raw value.
        value: String,
    },

    /// Failed to parse a TOML configuration document.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to parse a JSON configuration document.
    #[error("failed to parse config: {0}")]
    ConfigJson(#[from] serde_json::Error),
}
