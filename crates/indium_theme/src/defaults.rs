//! Built-in default token set
//!
//! The defaults ship as an embedded TOML document, parsed once per process
//! and shared read-only. Merging always copies out of it.

use std::sync::OnceLock;

use crate::schema::TokenConfig;
use crate::tree::TokenTree;

/// Source of the default token set
pub const DEFAULTS_TOML: &str = include_str!("defaults.toml");

static DEFAULT_TREE: OnceLock<TokenTree> = OnceLock::new();
static DEFAULT_CONFIG: OnceLock<TokenConfig> = OnceLock::new();

/// The default token tree (merge base for user overrides)
pub fn default_tree() -> &'static TokenTree {
    DEFAULT_TREE.get_or_init(|| {
        toml::from_str(DEFAULTS_TOML).expect("embedded defaults.toml must be valid TOML")
    })
}

/// The default configuration, typed
pub fn default_config() -> &'static TokenConfig {
    DEFAULT_CONFIG.get_or_init(|| {
        TokenConfig::from_tree(default_tree())
            .expect("embedded defaults.toml must match the token schema")
    })
}
