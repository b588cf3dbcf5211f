//! Configuration file discovery, parsing and merging
//!
//! A project customizes the token set with an `indium.config.{toml,json,yaml,yml}`
//! file next to its stylesheet. The document holds a partial token tree that
//! is deep-merged onto the built-in defaults.
//!
//! # Example
//!
//! ```toml
//! [primitives.colors.blue]
//! 500 = "#0000ff"
//!
//! [semantic.light.colors.action.primary]
//! normal = "blue.500"
//! ```
//!
//! Loading never fails from the caller's point of view: a broken file yields
//! the defaults plus a warning in [`LoadedConfig::warnings`].

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::defaults::{default_config, default_tree};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::error::{ConfigError, Result};
use crate::schema::TokenConfig;
use crate::tree::{deep_merge, Scalar, TokenTree};

/// File name stem of the user configuration
pub const CONFIG_STEM: &str = "indium.config";

/// Extensions probed by [`find_config_file`], in priority order
pub const CONFIG_EXTENSIONS: [&str; 4] = ["toml", "json", "yaml", "yml"];

/// Top-level keys a configuration document may contain
pub const KNOWN_KEYS: [&str; 2] = ["primitives", "semantic"];

/// Keys directly under `primitives`
pub const PRIMITIVE_KEYS: [&str; 9] = [
    "colors",
    "typography",
    "spacing",
    "sizing",
    "border",
    "shadow",
    "zIndex",
    "transition",
    "breakpoint",
];

/// Keys directly under each `semantic.<mode>`
pub const THEME_KEYS: [&str; 3] = ["colors", "typography", "sizing"];

/// Configuration document format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Conventional file name for this format
    pub fn file_name(self) -> String {
        format!("{CONFIG_STEM}.{}", self.extension())
    }
}

/// Result of loading the configuration for a project
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    /// Defaults merged with the user configuration
    pub config: TokenConfig,
    /// The configuration file that was found, if any
    pub path: Option<PathBuf>,
    /// Problems encountered while loading
    pub warnings: Vec<Diagnostic>,
    /// Set when a configuration file exists but could not be used
    pub fallback_reason: Option<String>,
}

impl LoadedConfig {
    /// The built-in defaults, with no configuration file
    pub fn defaults() -> Self {
        Self {
            config: default_config().clone(),
            path: None,
            warnings: Vec::new(),
            fallback_reason: None,
        }
    }

    /// Whether the user configuration was rejected in favor of the defaults
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Find the configuration file in `cwd`
///
/// Returns the first existing `indium.config.<ext>` in [`CONFIG_EXTENSIONS`]
/// order.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| cwd.join(format!("{CONFIG_STEM}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Parse a configuration document
///
/// `path` is only used for error messages. Export wrappers
/// (`default`, `module.exports`) are stripped.
pub fn parse_config_str(source: &str, format: ConfigFormat, path: &Path) -> Result<TokenTree> {
    let tree = match format {
        ConfigFormat::Toml => toml::from_str(source).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        ConfigFormat::Json => serde_json::from_str(source).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        ConfigFormat::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(source).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?;
            yaml_to_tree(value)?
        }
    };
    Ok(tree.unwrap_export())
}

/// Convert YAML to a token tree, stringifying scalar mapping keys
///
/// YAML palettes are usually written with bare numeric shade keys (`500:`).
fn yaml_to_tree(value: serde_yaml::Value) -> Result<TokenTree> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => TokenTree::Null,
        Value::Bool(b) => TokenTree::Value(Scalar::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TokenTree::Value(Scalar::Int(i)),
            None => TokenTree::Value(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => TokenTree::Value(Scalar::Str(s)),
        Value::Sequence(items) => TokenTree::List(
            items
                .into_iter()
                .map(yaml_to_tree)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut map = IndexMap::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(ConfigError::Schema(format!(
                            "unsupported mapping key: {other:?}"
                        )))
                    }
                };
                map.insert(key, yaml_to_tree(value)?);
            }
            TokenTree::Map(map)
        }
        Value::Tagged(tagged) => yaml_to_tree(tagged.value)?,
    })
}

/// Read and parse a configuration file
pub fn read_config_file(path: &Path) -> Result<TokenTree> {
    let format =
        ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.into()))?;
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&source, format, path)
}

/// Check the shape of a user configuration
///
/// A non-mapping document is an error. Unknown keys at the top level, under
/// `primitives` and under each `semantic.<mode>` are reported as warnings
/// and otherwise ignored.
pub fn validate_config(tree: &TokenTree, diagnostics: &mut Diagnostics) -> Result<()> {
    fn unknown_keys(
        map: &IndexMap<String, TokenTree>,
        prefix: &str,
        known: &[&str],
        diagnostics: &mut Diagnostics,
    ) {
        for key in map.keys() {
            if !known.contains(&key.as_str()) {
                let path = format!("{prefix}{key}");
                diagnostics.warn(format!("Unknown config key: {path}"), path);
            }
        }
    }

    let map = tree.as_map().ok_or(ConfigError::NotATable)?;
    unknown_keys(map, "", &KNOWN_KEYS, diagnostics);

    if let Some(primitives) = map.get("primitives").and_then(TokenTree::as_map) {
        unknown_keys(primitives, "primitives.", &PRIMITIVE_KEYS, diagnostics);
    }
    if let Some(semantic) = map.get("semantic").and_then(TokenTree::as_map) {
        for (mode, theme) in semantic {
            if let Some(theme) = theme.as_map() {
                let prefix = format!("semantic.{mode}.");
                unknown_keys(theme, &prefix, &THEME_KEYS, diagnostics);
            }
        }
    }
    Ok(())
}

/// Merge a user configuration onto the defaults and type it
pub fn merge_with_defaults(user: &TokenTree) -> Result<TokenConfig> {
    TokenConfig::from_tree(&deep_merge(default_tree(), user))
}

/// Turn a parse result into a [`LoadedConfig`], falling back to defaults
///
/// Shared by the blocking and async loaders.
pub fn finish_load(path: PathBuf, parsed: Result<TokenTree>) -> LoadedConfig {
    let mut diagnostics = Diagnostics::new();

    let config = parsed.and_then(|tree| {
        validate_config(&tree, &mut diagnostics)?;
        merge_with_defaults(&tree)
    });

    match config {
        Ok(config) => {
            debug!(path = %path.display(), "loaded config");
            LoadedConfig {
                config,
                path: Some(path),
                warnings: diagnostics.into_vec(),
                fallback_reason: None,
            }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load config, using defaults");
            diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    format!("Failed to load config, using defaults: {err}"),
                )
                .with_subject(path.display().to_string()),
            );
            LoadedConfig {
                config: default_config().clone(),
                path: Some(path),
                warnings: diagnostics.into_vec(),
                fallback_reason: Some(err.to_string()),
            }
        }
    }
}

/// Load the configuration from an explicit file, or the defaults for `None`
pub fn load_config_from(path: Option<&Path>) -> LoadedConfig {
    match path {
        Some(path) => finish_load(path.to_path_buf(), read_config_file(path)),
        None => {
            debug!("no config file, using defaults");
            LoadedConfig::defaults()
        }
    }
}

/// Discover and load the configuration for a project directory (blocking)
pub fn load_config(cwd: &Path) -> LoadedConfig {
    load_config_from(find_config_file(cwd).as_deref())
}
