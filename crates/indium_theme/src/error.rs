//! Error types for configuration loading and theme generation

use std::path::PathBuf;

use thiserror::Error;

use crate::stylesheet::StylesheetError;

/// Configuration loading errors
///
/// None of these are fatal to CSS generation: the loader recovers from every
/// variant by falling back to the default token set.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax error
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// JSON syntax error
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML syntax error
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// File extension is not one of the supported formats
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The document root is not a mapping
    #[error("config must be a table/object at the top level")]
    NotATable,

    /// The merged tree does not fit the token schema
    #[error("config does not match the token schema: {0}")]
    Schema(String),

    /// Loading was aborted by the configuration source
    #[error("config source failed: {0}")]
    Source(String),
}

/// Theme generation errors
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The generated CSS did not parse back into stylesheet nodes
    #[error("generated theme CSS is invalid: {0}")]
    InvalidCss(#[from] StylesheetError),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
