//! Indium Theme Engine
//!
//! Design-token resolution and CSS custom property generation for Indium UI.
//!
//! # Overview
//!
//! Tokens come in two layers:
//! - **Primitives**: raw values (color palettes, type scales, spacing, radii,
//!   shadows, z-indices, transitions, breakpoints)
//! - **Semantic tokens**: per-theme values (`light`, `dark`, any custom mode)
//!   that refer to primitives by name, e.g. `"gray.900"` or `"blue.700/25"`
//!
//! A project overrides any part of the built-in defaults with an
//! `indium.config.{toml,json,yaml}` file. The engine deep-merges it onto the
//! defaults, resolves every reference and emits one stylesheet of CSS custom
//! properties.
//!
//! # Quick Start
//!
//! ```rust
//! use indium_theme::{default_config, generate_theme_css, Diagnostics};
//!
//! let mut diagnostics = Diagnostics::new();
//! let css = generate_theme_css(default_config(), &mut diagnostics);
//!
//! assert!(css.contains("--color-blue-500: #3b82f6;"));
//! assert!(diagnostics.is_empty());
//! ```
//!
//! # Build integration
//!
//! [`ThemePlugin`] replaces the `@indium-theme;` directive in a stylesheet.
//! It loads configuration through a shared [`ConfigCache`], so a host that
//! watches files only needs to forward change events:
//!
//! ```rust,ignore
//! let plugin = ThemePlugin::new(PluginOptions::default());
//! let result = plugin.process(&css, Some(path)).await;
//!
//! // later, from the file watcher
//! if plugin.handle_file_change(&changed) {
//!     rebuild();
//! }
//! ```
//!
//! # Diagnostics
//!
//! Nothing in the pipeline aborts on bad input. Unknown references are
//! emitted unchanged, broken configuration files fall back to the defaults,
//! and each problem is recorded as a [`Diagnostic`] (and logged through
//! `tracing`).

pub mod cache;
pub mod color;
pub mod defaults;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod loader;
pub mod plugin;
pub mod schema;
pub mod stylesheet;
pub mod tree;
pub mod typography;

// Re-export commonly used types
pub use cache::{CacheStatus, ConfigCache, ConfigSource, FileSource};
pub use color::{hex_to_rgb, normalize_alpha, resolve_color};
pub use defaults::{default_config, default_tree};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use emit::{
    breakpoint_variables, flatten_semantic_colors, generate_theme_css, inline_theme,
    primitive_variables, theme_variables, CssVars,
};
pub use error::{ConfigError, GenerateError, Result};
pub use loader::{
    find_config_file, load_config, load_config_from, read_config_file, validate_config,
    ConfigFormat, LoadedConfig,
};
pub use plugin::{render_theme, Message, PluginOptions, ProcessResult, ThemePlugin};
pub use schema::{Semantic, SemanticTheme, TokenConfig};
pub use stylesheet::{Stylesheet, StylesheetError};
pub use tree::{deep_merge, Scalar, TokenTree};
pub use typography::{
    calculate_heading_scale, resolve_default_typography, resolve_typography_refs,
    HEADING_SIZE_MULTIPLIERS,
};
